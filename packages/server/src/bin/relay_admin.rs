//! Operator CLI for the relay database
//!
//! Runs the same engine operations the bot uses against the configured
//! database. Every command prints one JSON object per line.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use relay_core::common::HolderId;
use relay_core::config::Config;
use relay_core::domains::ledger::WithdrawalMethod;
use relay_core::kernel::{
    BaseNotifier, LogNotifier, PostgresRelayStore, RelayEngine, RelayStore, TelegramAdapter,
};
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::json;
use sqlx::postgres::PgPoolOptions;
use std::io::Read;
use std::sync::Arc;
use telegram::{TelegramOptions, TelegramService};

#[derive(Parser)]
#[command(name = "relay_admin")]
#[command(about = "Operator commands for the number relay")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Add numbers to the pool (arguments, or one per line on stdin)
    Add {
        numbers: Vec<String>,
        /// Tell every holder that stock arrived
        #[arg(long)]
        announce: bool,
    },

    /// Remove one number from the pool
    Remove { number: String },

    /// Empty the pool
    Clear {
        /// Tell every holder the pool is empty
        #[arg(long)]
        announce: bool,
    },

    /// Pool size and live assignment count
    Stats,

    /// Show a holder's balance
    Balance { holder: HolderId },

    /// Issue a number to a holder
    Request { holder: HolderId },

    /// Route channel text (argument, or stdin) and deliver matches
    Route { text: Option<String> },

    /// Drop the assignment of a number
    ClearAssignment { number: String },

    /// List known holders
    Holders,

    /// Send a message to every holder
    Broadcast { text: String },

    /// Drop assignments older than ASSIGNMENT_TTL_SECONDS
    Expire,

    /// Request a withdrawal on behalf of a holder
    Withdraw {
        holder: HolderId,
        method: WithdrawalMethod,
        amount: Decimal,
        details: String,
    },

    /// List a holder's withdrawal requests
    Withdrawals { holder: HolderId },
}

fn output<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string(value)?);
    Ok(())
}

// ============================================================================
// Main
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let engine = build_engine().await?;

    match cli.command {
        Commands::Add { numbers, announce } => {
            let numbers = if numbers.is_empty() {
                read_stdin()?.lines().map(str::to_string).collect()
            } else {
                numbers
            };
            let added = engine.add_numbers(&numbers).await?;
            let total = engine.stock_count().await?;
            output(&json!({ "success": true, "added": added, "total": total }))?;
            if announce && added > 0 {
                output(&engine.announce_restock().await?)?;
            }
        }
        Commands::Remove { number } => {
            let removed = engine.remove_number(&number).await?;
            output(&json!({ "success": removed }))?;
        }
        Commands::Clear { announce } => {
            let removed = engine.clear_all_numbers().await?;
            output(&json!({ "success": true, "removed": removed }))?;
            if announce {
                output(&engine.announce_cleared().await?)?;
            }
        }
        Commands::Stats => {
            let stock = engine.stock_count().await?;
            let assignments = engine.store().assignment_count().await?;
            let holders = engine.holders().await?.len();
            output(&json!({
                "stock": stock,
                "assignments": assignments,
                "holders": holders,
            }))?;
        }
        Commands::Balance { holder } => {
            let balance = engine.get_balance(holder).await?;
            output(&json!({ "holder": holder, "balance": balance }))?;
        }
        Commands::Request { holder } => {
            output(&engine.request_number(holder).await?)?;
        }
        Commands::Route { text } => {
            let text = match text {
                Some(text) => text,
                None => read_stdin()?,
            };
            for event in engine.on_channel_message(&text).await? {
                let delivered = engine.deliver(&event).await;
                output(&json!({ "event": event, "delivered": delivered }))?;
            }
        }
        Commands::ClearAssignment { number } => {
            let cleared = engine.clear_assignment(&number).await?;
            output(&json!({ "success": cleared }))?;
        }
        Commands::Holders => {
            output(&engine.holders().await?)?;
        }
        Commands::Broadcast { text } => {
            output(&engine.broadcast(&text).await?)?;
        }
        Commands::Expire => {
            let expired = engine.expire_assignments(chrono::Utc::now()).await?;
            output(&json!({ "expired": expired }))?;
        }
        Commands::Withdraw {
            holder,
            method,
            amount,
            details,
        } => {
            output(
                &engine
                    .request_withdrawal(holder, method, &details, amount)
                    .await?,
            )?;
        }
        Commands::Withdrawals { holder } => {
            output(&engine.withdrawals(holder).await?)?;
        }
    }

    Ok(())
}

async fn build_engine() -> Result<RelayEngine> {
    let config = Config::from_env()?;

    let pool = PgPoolOptions::new()
        .max_connections(2)
        .connect(&config.database_url)
        .await
        .context("Failed to connect to database")?;
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("Failed to run migrations")?;

    // Without a bot token, notices only reach the log
    let notifier: Arc<dyn BaseNotifier> = match config.telegram_bot_token.as_deref() {
        Some(token) => Arc::new(TelegramAdapter::new(
            Arc::new(TelegramService::new(TelegramOptions::new(token))),
            config.operator_chat_id,
        )),
        None => Arc::new(LogNotifier),
    };

    RelayEngine::new(
        Arc::new(PostgresRelayStore::new(pool)),
        notifier,
        config.settings,
    )
    .context("Failed to build relay engine")
}

fn read_stdin() -> Result<String> {
    let mut input = String::new();
    std::io::stdin()
        .read_to_string(&mut input)
        .context("Failed to read stdin")?;
    Ok(input)
}
