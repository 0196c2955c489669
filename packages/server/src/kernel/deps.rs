//! Concrete notifier implementations
//!
//! `TelegramAdapter` wraps the Bot API client; `LogNotifier` only writes to
//! the log and backs tooling that runs without a bot token.

use anyhow::{Context, Result};
use async_trait::async_trait;
use std::sync::Arc;
use telegram::TelegramService;
use tracing::info;

use crate::common::HolderId;
use crate::kernel::BaseNotifier;

// =============================================================================
// TelegramService Adapter (implements BaseNotifier trait)
// =============================================================================

/// Wrapper around TelegramService that implements BaseNotifier trait
pub struct TelegramAdapter {
    service: Arc<TelegramService>,
    operator_chat_id: i64,
}

impl TelegramAdapter {
    pub fn new(service: Arc<TelegramService>, operator_chat_id: i64) -> Self {
        Self {
            service,
            operator_chat_id,
        }
    }
}

#[async_trait]
impl BaseNotifier for TelegramAdapter {
    async fn send_to_holder(&self, holder_id: HolderId, text: &str) -> Result<()> {
        self.service
            .send_message(holder_id.as_i64(), text)
            .await
            .with_context(|| format!("sendMessage to holder {} failed", holder_id))?;
        Ok(())
    }

    async fn send_to_operator(&self, text: &str) -> Result<()> {
        self.service
            .send_message(self.operator_chat_id, text)
            .await
            .context("sendMessage to operator failed")?;
        Ok(())
    }
}

// =============================================================================
// LogNotifier
// =============================================================================

#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

#[async_trait]
impl BaseNotifier for LogNotifier {
    async fn send_to_holder(&self, holder_id: HolderId, text: &str) -> Result<()> {
        info!(holder_id = %holder_id, "[notify holder] {}", text);
        Ok(())
    }

    async fn send_to_operator(&self, text: &str) -> Result<()> {
        info!("[notify operator] {}", text);
        Ok(())
    }
}
