// Trait definitions for dependency injection
//
// These are INFRASTRUCTURE traits only - no business logic.
//
// Naming convention: Base* for trait names (e.g., BaseNotifier)

use anyhow::Result;
use async_trait::async_trait;

use crate::common::HolderId;

// =============================================================================
// Notifier Trait (Infrastructure - outbound messages)
// =============================================================================

/// Outbound side of the messaging transport.
///
/// Failures are reported to the caller, who logs and moves on. Nothing in
/// the core is rolled back because a send failed.
#[async_trait]
pub trait BaseNotifier: Send + Sync {
    /// Send text to a holder (OTP deliveries, broadcasts).
    async fn send_to_holder(&self, holder_id: HolderId, text: &str) -> Result<()>;

    /// Send text to the operator (depletion notices, withdrawal intents).
    async fn send_to_operator(&self, text: &str) -> Result<()>;
}
