// TestDependencies - mock implementations for testing
//
// Provides a recording notifier and a ready-made in-memory engine.

use anyhow::Result;
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use super::{BaseNotifier, MemoryRelayStore, RelayEngine};
use crate::common::HolderId;
use crate::config::RelaySettings;

// =============================================================================
// Recording Notifier
// =============================================================================

/// A message captured by [`RecordingNotifier`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SentMessage {
    Holder { holder_id: HolderId, text: String },
    Operator { text: String },
}

pub struct RecordingNotifier {
    sent: Arc<Mutex<Vec<SentMessage>>>,
    unreachable: Arc<Mutex<HashSet<HolderId>>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self {
            sent: Arc::new(Mutex::new(Vec::new())),
            unreachable: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    /// Make sends to `holder_id` fail, like a holder who blocked the bot.
    pub fn with_unreachable(self, holder_id: HolderId) -> Self {
        self.unreachable.lock().unwrap().insert(holder_id);
        self
    }

    pub fn sent(&self) -> Vec<SentMessage> {
        self.sent.lock().unwrap().clone()
    }

    pub fn operator_messages(&self) -> Vec<String> {
        self.sent()
            .into_iter()
            .filter_map(|m| match m {
                SentMessage::Operator { text } => Some(text),
                SentMessage::Holder { .. } => None,
            })
            .collect()
    }

    pub fn messages_for(&self, holder_id: HolderId) -> Vec<String> {
        self.sent()
            .into_iter()
            .filter_map(|m| match m {
                SentMessage::Holder { holder_id: h, text } if h == holder_id => Some(text),
                _ => None,
            })
            .collect()
    }
}

impl Default for RecordingNotifier {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BaseNotifier for RecordingNotifier {
    async fn send_to_holder(&self, holder_id: HolderId, text: &str) -> Result<()> {
        if self.unreachable.lock().unwrap().contains(&holder_id) {
            anyhow::bail!("recipient has blocked the bot");
        }
        self.sent.lock().unwrap().push(SentMessage::Holder {
            holder_id,
            text: text.to_string(),
        });
        Ok(())
    }

    async fn send_to_operator(&self, text: &str) -> Result<()> {
        self.sent.lock().unwrap().push(SentMessage::Operator {
            text: text.to_string(),
        });
        Ok(())
    }
}

// =============================================================================
// TestDependencies
// =============================================================================

/// In-memory engine plus handles to its collaborators.
pub struct TestDependencies {
    pub engine: Arc<RelayEngine>,
    pub store: Arc<MemoryRelayStore>,
    pub notifier: Arc<RecordingNotifier>,
}

impl TestDependencies {
    pub fn new() -> Self {
        Self::with_notifier(RelaySettings::default(), RecordingNotifier::new())
    }

    pub fn with_settings(settings: RelaySettings) -> Self {
        Self::with_notifier(settings, RecordingNotifier::new())
    }

    pub fn with_notifier(settings: RelaySettings, notifier: RecordingNotifier) -> Self {
        let store = Arc::new(MemoryRelayStore::with_seed(42));
        let notifier = Arc::new(notifier);
        let engine = RelayEngine::new(store.clone(), notifier.clone(), settings)
            .expect("default extraction pattern compiles");
        Self {
            engine: Arc::new(engine),
            store,
            notifier,
        }
    }
}

impl Default for TestDependencies {
    fn default() -> Self {
        Self::new()
    }
}
