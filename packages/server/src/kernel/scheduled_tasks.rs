//! Scheduled background tasks using tokio-cron-scheduler.
//!
//! Only the assignment expiry sweep lives here, and only when an assignment
//! TTL is configured. Expired numbers are not returned to the pool.

use anyhow::Result;
use chrono::Utc;
use std::sync::Arc;
use tokio_cron_scheduler::{Job, JobScheduler};

use super::engine::RelayEngine;

/// Start all scheduled tasks. Returns None when nothing needs scheduling.
pub async fn start_scheduler(engine: Arc<RelayEngine>) -> Result<Option<JobScheduler>> {
    if engine.settings().assignment_ttl.is_none() {
        tracing::info!("Assignment TTL not set, expiry sweep disabled");
        return Ok(None);
    }

    let scheduler = JobScheduler::new().await?;

    // Expiry sweep - runs every minute
    let sweep_engine = engine.clone();
    let sweep_job = Job::new_async("0 * * * * *", move |_uuid, _lock| {
        let engine = sweep_engine.clone();
        Box::pin(async move {
            if let Err(e) = engine.expire_assignments(Utc::now()).await {
                tracing::error!("Assignment expiry sweep failed: {}", e);
            }
        })
    })?;

    scheduler.add(sweep_job).await?;
    scheduler.start().await?;

    tracing::info!("Scheduled tasks started (assignment expiry every minute)");
    Ok(Some(scheduler))
}
