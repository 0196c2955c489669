// Storage seam for the relay core
//
// Every method that touches more than one table is a single transaction (or a
// single critical section for the in-memory store). Implementations must keep
// both assignment uniqueness rules even under concurrent callers.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::common::{HolderId, Money, NormalizedNumber, RelayResult};
use crate::domains::assignments::Assignment;
use crate::domains::cooldown::CooldownGate;
use crate::domains::ledger::{DebitOutcome, WithdrawalIntent, WithdrawalQuote};

/// A number handed to a holder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IssuedNumber {
    pub raw_value: String,
    pub normalized: NormalizedNumber,
    /// The holder's previous assignment, now gone.
    pub superseded: Option<NormalizedNumber>,
}

/// Result of asking for a number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum IssueOutcome {
    Issued(IssuedNumber),
    Denied { seconds_remaining: i64 },
    OutOfStock,
}

/// Result of recording a withdrawal intent.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum WithdrawalRecord {
    Recorded {
        intent: WithdrawalIntent,
        balance: Money,
    },
    InsufficientBalance {
        balance: Money,
    },
}

#[async_trait]
pub trait RelayStore: Send + Sync {
    // ---------------------------------------------------------------------
    // Holders
    // ---------------------------------------------------------------------

    /// Add the holder to the registry and open a zero balance. Idempotent.
    async fn register_holder(&self, holder_id: HolderId) -> RelayResult<bool>;

    async fn holders(&self) -> RelayResult<Vec<HolderId>>;

    // ---------------------------------------------------------------------
    // Pool
    // ---------------------------------------------------------------------

    async fn stock_count(&self) -> RelayResult<i64>;

    /// Stock the given values. Duplicates and digitless values are skipped.
    async fn add_numbers(&self, raw_values: &[String]) -> RelayResult<usize>;

    async fn remove_number(&self, raw_value: &str) -> RelayResult<bool>;

    async fn clear_numbers(&self) -> RelayResult<u64>;

    /// Cooldown check, random withdrawal, cooldown commit and assignment,
    /// all or nothing. The cooldown only moves when a number was taken.
    async fn issue(
        &self,
        holder_id: HolderId,
        now: DateTime<Utc>,
        gate: &CooldownGate,
    ) -> RelayResult<IssueOutcome>;

    // ---------------------------------------------------------------------
    // Assignments
    // ---------------------------------------------------------------------

    async fn resolve(&self, number: &NormalizedNumber) -> RelayResult<Option<HolderId>>;

    async fn assignment_for(&self, holder_id: HolderId) -> RelayResult<Option<Assignment>>;

    async fn assignment_count(&self) -> RelayResult<i64>;

    /// Credit `holder_id` and then clear the assignment, provided `number`
    /// is still bound to that holder. Returns false when it no longer is.
    async fn settle_match(
        &self,
        number: &NormalizedNumber,
        holder_id: HolderId,
        credit: Money,
    ) -> RelayResult<bool>;

    async fn clear_assignment(&self, number: &NormalizedNumber) -> RelayResult<bool>;

    async fn expire_assignments(&self, cutoff: DateTime<Utc>) -> RelayResult<Vec<Assignment>>;

    // ---------------------------------------------------------------------
    // Ledger
    // ---------------------------------------------------------------------

    async fn balance(&self, holder_id: HolderId) -> RelayResult<Money>;

    /// Compare and debit as one step.
    async fn debit_if_sufficient(
        &self,
        holder_id: HolderId,
        amount: Money,
    ) -> RelayResult<DebitOutcome>;

    /// Guarded debit plus intent record, all or nothing.
    async fn record_withdrawal(
        &self,
        holder_id: HolderId,
        quote: &WithdrawalQuote,
        details: &str,
    ) -> RelayResult<WithdrawalRecord>;

    async fn withdrawals(&self, holder_id: HolderId) -> RelayResult<Vec<WithdrawalIntent>>;
}
