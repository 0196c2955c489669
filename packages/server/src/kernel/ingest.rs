//! Ingestion tasks - one per event source.
//!
//! ```text
//! Bot API long-poll ──► poll_channel_posts ──► mpsc ──► channel ingest (serial)
//!                                                          └─► engine.on_channel_message → deliver
//!
//! transport requests ──► mpsc ──► request ingest ──► task per request
//!                                                       └─► engine.request_number → oneshot reply
//! ```
//!
//! Both feed the same `RelayEngine`; neither knows how the other is scheduled.

use std::sync::Arc;
use std::time::Duration;

use telegram::TelegramService;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, error, warn};

use super::engine::RelayEngine;
use super::store::IssueOutcome;
use crate::common::{HolderId, RelayResult};

const POLL_TIMEOUT: Duration = Duration::from_secs(30);
const POLL_RETRY_DELAY: Duration = Duration::from_secs(5);

/// Consume channel text in arrival order.
///
/// Stops with the first store error; delivery failures are logged inside
/// [`RelayEngine::deliver`] and do not stop the stream.
pub fn spawn_channel_ingest(
    engine: Arc<RelayEngine>,
    mut rx: mpsc::Receiver<String>,
) -> JoinHandle<RelayResult<()>> {
    tokio::spawn(async move {
        while let Some(text) = rx.recv().await {
            let deliveries = engine.on_channel_message(&text).await.map_err(|e| {
                error!(error = %e, "channel ingest stopped");
                e
            })?;
            for event in &deliveries {
                engine.deliver(event).await;
            }
        }
        debug!("channel ingest closed");
        Ok(())
    })
}

/// A holder asking for a number, with a slot for the answer.
pub struct NumberRequest {
    pub holder_id: HolderId,
    pub respond_to: oneshot::Sender<RelayResult<IssueOutcome>>,
}

impl NumberRequest {
    pub fn new(holder_id: HolderId) -> (Self, oneshot::Receiver<RelayResult<IssueOutcome>>) {
        let (respond_to, rx) = oneshot::channel();
        (
            Self {
                holder_id,
                respond_to,
            },
            rx,
        )
    }
}

/// Serve number requests, each on its own task.
pub fn spawn_request_ingest(
    engine: Arc<RelayEngine>,
    mut rx: mpsc::Receiver<NumberRequest>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(request) = rx.recv().await {
            let engine = engine.clone();
            tokio::spawn(async move {
                let outcome = engine.request_number(request.holder_id).await;
                if request.respond_to.send(outcome).is_err() {
                    debug!(holder_id = %request.holder_id, "requester went away");
                }
            });
        }
        debug!("request ingest closed");
    })
}

/// Long-poll the Bot API and forward channel posts to `tx`.
///
/// With `source_chat_id` set, posts from other chats are ignored. Returns
/// once the receiving side is gone.
pub async fn poll_channel_posts(
    service: Arc<TelegramService>,
    source_chat_id: Option<i64>,
    tx: mpsc::Sender<String>,
) -> anyhow::Result<()> {
    let mut offset = 0;
    loop {
        let updates = match service.get_updates(offset, POLL_TIMEOUT).await {
            Ok(updates) => updates,
            Err(e) => {
                warn!(error = %e, "getUpdates failed, retrying");
                tokio::time::sleep(POLL_RETRY_DELAY).await;
                continue;
            }
        };

        for update in updates {
            offset = offset.max(update.update_id + 1);
            let Some(post) = update.channel_post else {
                continue;
            };
            if source_chat_id.is_some_and(|id| id != post.chat.id) {
                continue;
            }
            let Some(body) = post.body() else {
                continue;
            };
            if tx.send(body.to_string()).await.is_err() {
                return Ok(());
            }
        }
    }
}
