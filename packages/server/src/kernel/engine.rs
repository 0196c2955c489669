// RelayEngine - the operation set the transport layer calls into
//
// Holds the store, the notifier and the immutable settings. Safe to share
// behind an Arc between the request path and the channel path.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};

use super::depletion::DepletionLatch;
use super::store::{IssueOutcome, RelayStore, WithdrawalRecord};
use super::BaseNotifier;
use crate::common::{HolderId, Money, NormalizedNumber, RelayError, RelayResult};
use crate::config::RelaySettings;
use crate::domains::assignments::Assignment;
use crate::domains::cooldown::CooldownGate;
use crate::domains::ledger::{DebitOutcome, QuoteRefusal, WithdrawalIntent, WithdrawalMethod};
use crate::domains::routing::{DeliveryEvent, OtpRouter};

const DEPLETION_NOTICE: &str =
    "🚨 All numbers have been handed out. Please add new numbers soon.";

/// Result of a withdrawal request.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum WithdrawalOutcome {
    Requested { intent: WithdrawalIntent, balance: Money },
    /// Amount below the method minimum (in the method's currency).
    BelowMinimum { minimum: Money },
    InsufficientBalance { balance: Money },
}

/// Tally of a broadcast run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BroadcastReport {
    pub sent: usize,
    pub failed: usize,
}

pub struct RelayEngine {
    store: Arc<dyn RelayStore>,
    notifier: Arc<dyn BaseNotifier>,
    settings: RelaySettings,
    gate: CooldownGate,
    router: OtpRouter,
    depletion: DepletionLatch,
}

impl RelayEngine {
    pub fn new(
        store: Arc<dyn RelayStore>,
        notifier: Arc<dyn BaseNotifier>,
        settings: RelaySettings,
    ) -> RelayResult<Self> {
        let router = OtpRouter::new(&settings)?;
        Ok(Self {
            store,
            notifier,
            gate: CooldownGate::new(settings.cooldown),
            router,
            settings,
            depletion: DepletionLatch::new(),
        })
    }

    pub fn settings(&self) -> &RelaySettings {
        &self.settings
    }

    pub fn store(&self) -> &Arc<dyn RelayStore> {
        &self.store
    }

    // =========================================================================
    // Holder-facing operations
    // =========================================================================

    pub async fn request_number(&self, holder_id: HolderId) -> RelayResult<IssueOutcome> {
        self.request_number_at(holder_id, Utc::now()).await
    }

    /// [`RelayEngine::request_number`] with an explicit clock reading.
    pub async fn request_number_at(
        &self,
        holder_id: HolderId,
        now: DateTime<Utc>,
    ) -> RelayResult<IssueOutcome> {
        self.store.register_holder(holder_id).await?;
        let outcome = self.store.issue(holder_id, now, &self.gate).await?;

        match &outcome {
            IssueOutcome::Issued(issued) => {
                self.depletion.reset();
                if let Some(previous) = &issued.superseded {
                    info!(holder_id = %holder_id, previous = %previous, "assignment superseded");
                }
                info!(holder_id = %holder_id, number = %issued.normalized, "number issued");
            }
            IssueOutcome::Denied { seconds_remaining } => {
                info!(holder_id = %holder_id, seconds_remaining, "request inside cooldown");
            }
            IssueOutcome::OutOfStock => {
                if self.depletion.trip() {
                    warn!("number pool depleted");
                    self.notify_operator(DEPLETION_NOTICE).await;
                }
            }
        }

        Ok(outcome)
    }

    pub async fn get_balance(&self, holder_id: HolderId) -> RelayResult<Money> {
        self.store.register_holder(holder_id).await?;
        self.store.balance(holder_id).await
    }

    /// Debit for a withdrawal the caller already validated.
    ///
    /// The balance check and the debit happen as one step in the store.
    pub async fn debit_for_withdrawal(
        &self,
        holder_id: HolderId,
        amount: Money,
    ) -> RelayResult<DebitOutcome> {
        ensure_positive(amount)?;
        let outcome = self.store.debit_if_sufficient(holder_id, amount).await?;
        if let DebitOutcome::Debited { balance } = outcome {
            info!(holder_id = %holder_id, amount = %amount, balance = %balance, "balance debited");
        }
        Ok(outcome)
    }

    /// Price, debit and record a withdrawal, then tell the operator.
    pub async fn request_withdrawal(
        &self,
        holder_id: HolderId,
        method: WithdrawalMethod,
        details: &str,
        amount: Money,
    ) -> RelayResult<WithdrawalOutcome> {
        ensure_positive(amount)?;
        self.store.register_holder(holder_id).await?;

        let quote = match self.settings.withdrawal.quote(method, amount) {
            Ok(quote) => quote,
            Err(QuoteRefusal::BelowMinimum { minimum }) => {
                return Ok(WithdrawalOutcome::BelowMinimum { minimum })
            }
            Err(QuoteRefusal::OutOfRange) => {
                return Err(RelayError::InvalidAmount(format!(
                    "{} {} is out of range",
                    amount,
                    method.currency()
                )))
            }
        };

        match self.store.record_withdrawal(holder_id, &quote, details).await? {
            WithdrawalRecord::InsufficientBalance { balance } => {
                Ok(WithdrawalOutcome::InsufficientBalance { balance })
            }
            WithdrawalRecord::Recorded { intent, balance } => {
                info!(
                    holder_id = %holder_id,
                    method = %method,
                    amount_base = %quote.amount_base,
                    "withdrawal requested"
                );
                let notice = format!(
                    "🔔 New withdrawal request #{}\n\nHolder: {}\nMethod: {}\nAccount: {}\nAmount: {:.2} {}",
                    intent.id,
                    holder_id,
                    method,
                    details,
                    quote.amount,
                    method.currency(),
                );
                self.notify_operator(&notice).await;
                Ok(WithdrawalOutcome::Requested { intent, balance })
            }
        }
    }

    pub async fn withdrawals(&self, holder_id: HolderId) -> RelayResult<Vec<WithdrawalIntent>> {
        self.store.withdrawals(holder_id).await
    }

    // =========================================================================
    // Channel path
    // =========================================================================

    /// Match channel text against live assignments.
    ///
    /// Credits and clears are committed before this returns; delivering the
    /// returned events is the caller's job (see [`RelayEngine::deliver`]).
    pub async fn on_channel_message(&self, text: &str) -> RelayResult<Vec<DeliveryEvent>> {
        self.router.route(text, self.store.as_ref()).await
    }

    /// Forward one event to its holder. Failures are logged, never retried.
    pub async fn deliver(&self, event: &DeliveryEvent) -> bool {
        match self
            .notifier
            .send_to_holder(event.holder_id, &event.render())
            .await
        {
            Ok(()) => true,
            Err(e) => {
                warn!(holder_id = %event.holder_id, error = %e, "OTP delivery failed");
                false
            }
        }
    }

    // =========================================================================
    // Operator operations
    // =========================================================================

    pub async fn add_numbers(&self, raw_values: &[String]) -> RelayResult<usize> {
        let added = self.store.add_numbers(raw_values).await?;
        if added > 0 {
            self.depletion.reset();
        }
        info!(submitted = raw_values.len(), added, "numbers added");
        Ok(added)
    }

    pub async fn remove_number(&self, raw_value: &str) -> RelayResult<bool> {
        self.store.remove_number(raw_value).await
    }

    pub async fn clear_all_numbers(&self) -> RelayResult<u64> {
        let removed = self.store.clear_numbers().await?;
        info!(removed, "number pool cleared");
        Ok(removed)
    }

    pub async fn stock_count(&self) -> RelayResult<i64> {
        self.store.stock_count().await
    }

    /// Manual clear. Accepts the number in any formatting.
    pub async fn clear_assignment(&self, number: &str) -> RelayResult<bool> {
        let normalized = NormalizedNumber::from_raw(number);
        if normalized.is_empty() {
            return Ok(false);
        }
        self.store.clear_assignment(&normalized).await
    }

    pub async fn assignment_for(&self, holder_id: HolderId) -> RelayResult<Option<Assignment>> {
        self.store.assignment_for(holder_id).await
    }

    /// Drop assignments older than the configured TTL. A no-op without one.
    pub async fn expire_assignments(&self, now: DateTime<Utc>) -> RelayResult<Vec<Assignment>> {
        let Some(ttl) = self.settings.assignment_ttl else {
            return Ok(Vec::new());
        };
        // A TTL reaching past the calendar range expires nothing
        let Some(cutoff) = now.checked_sub_signed(ttl) else {
            return Ok(Vec::new());
        };
        let expired = self.store.expire_assignments(cutoff).await?;
        if !expired.is_empty() {
            info!(count = expired.len(), "assignments expired");
        }
        Ok(expired)
    }

    pub async fn holders(&self) -> RelayResult<Vec<HolderId>> {
        self.store.holders().await
    }

    /// Send `text` to every known holder, pacing sends.
    pub async fn broadcast(&self, text: &str) -> RelayResult<BroadcastReport> {
        let holders = self.store.holders().await?;
        let mut report = BroadcastReport::default();

        for holder_id in holders {
            match self.notifier.send_to_holder(holder_id, text).await {
                Ok(()) => report.sent += 1,
                Err(e) => {
                    warn!(holder_id = %holder_id, error = %e, "broadcast send failed");
                    report.failed += 1;
                }
            }
            if !self.settings.broadcast_delay.is_zero() {
                tokio::time::sleep(self.settings.broadcast_delay).await;
            }
        }

        info!(sent = report.sent, failed = report.failed, "broadcast finished");
        Ok(report)
    }

    /// Tell holders that fresh stock arrived.
    pub async fn announce_restock(&self) -> RelayResult<BroadcastReport> {
        let total = self.store.stock_count().await?;
        self.broadcast(&format!(
            "🎉 New numbers have been added.\n\nNumbers in stock: {}",
            total
        ))
        .await
    }

    /// Tell holders the pool was emptied.
    pub async fn announce_cleared(&self) -> RelayResult<BroadcastReport> {
        self.broadcast("Sorry, all numbers are gone. New numbers will be added soon.")
            .await
    }

    async fn notify_operator(&self, text: &str) {
        if let Err(e) = self.notifier.send_to_operator(text).await {
            warn!(error = %e, "operator notification failed");
        }
    }
}

fn ensure_positive(amount: Money) -> RelayResult<()> {
    if amount <= Decimal::ZERO {
        return Err(RelayError::InvalidAmount(format!(
            "amount must be positive, got {}",
            amount
        )));
    }
    Ok(())
}
