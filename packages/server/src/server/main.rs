// Main entry point for the relay bot

use anyhow::{Context, Result};
use relay_core::kernel::{
    poll_channel_posts, spawn_channel_ingest, start_scheduler, PostgresRelayStore, RelayEngine,
    TelegramAdapter,
};
use relay_core::Config;
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use telegram::{TelegramOptions, TelegramService};
use tokio::sync::mpsc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const CHANNEL_BUFFER: usize = 256;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,relay_core=debug,sqlx=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting number relay");

    // Load configuration
    let config = Config::from_env().context("Failed to load configuration")?;
    let bot_token = config.require_bot_token()?.to_string();
    tracing::info!("Configuration loaded");

    // Connect to database
    tracing::info!("Connecting to database...");
    let pool = PgPoolOptions::new()
        .max_connections(config.database_max_connections)
        .connect(&config.database_url)
        .await
        .context("Failed to connect to database")?;
    tracing::info!("Database connected");

    // Run migrations
    tracing::info!("Running database migrations...");
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("Failed to run migrations")?;
    tracing::info!("Migrations complete");

    // Wire the engine
    let telegram = Arc::new(TelegramService::new(TelegramOptions::new(bot_token)));
    let notifier = Arc::new(TelegramAdapter::new(
        telegram.clone(),
        config.operator_chat_id,
    ));
    let store = Arc::new(PostgresRelayStore::new(pool));
    let engine = Arc::new(
        RelayEngine::new(store, notifier, config.settings.clone())
            .context("Failed to build relay engine")?,
    );

    // Keep the handle alive for the life of the process
    let _scheduler = start_scheduler(engine.clone())
        .await
        .context("Failed to start scheduler")?;

    // Holder requests arrive through the conversational front-end, which
    // drives the engine directly or through spawn_request_ingest
    let (tx, rx) = mpsc::channel(CHANNEL_BUFFER);
    let ingest = spawn_channel_ingest(engine.clone(), rx);

    match config.source_chat_id {
        Some(id) => tracing::info!("Listening for channel posts from chat {}", id),
        None => tracing::info!("Listening for channel posts from any chat"),
    }

    tokio::select! {
        result = poll_channel_posts(telegram, config.source_chat_id, tx) => {
            result.context("Channel poller stopped")?;
        }
        result = ingest => {
            result
                .context("Channel ingest panicked")?
                .context("Channel ingest failed")?;
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutting down");
        }
    }

    Ok(())
}
