//! PostgreSQL-backed relay store.
//!
//! Each composite operation opens one transaction and hands `&mut *tx` to the
//! model functions, so cooldown, pool and assignment changes commit together.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::debug;

use super::store::{IssueOutcome, IssuedNumber, RelayStore, WithdrawalRecord};
use crate::common::{HolderId, Money, NormalizedNumber, RelayResult};
use crate::domains::assignments::Assignment;
use crate::domains::cooldown::{Cooldown, CooldownDecision, CooldownGate};
use crate::domains::ledger::{Balance, DebitOutcome, Holder, WithdrawalIntent, WithdrawalQuote};
use crate::domains::pool::NumberRecord;

pub struct PostgresRelayStore {
    pool: PgPool,
}

impl PostgresRelayStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl RelayStore for PostgresRelayStore {
    async fn register_holder(&self, holder_id: HolderId) -> RelayResult<bool> {
        let mut tx = self.pool.begin().await?;
        let created = Holder::register(holder_id, &mut tx).await?;
        Balance::open(holder_id, &mut tx).await?;
        tx.commit().await?;
        Ok(created)
    }

    async fn holders(&self) -> RelayResult<Vec<HolderId>> {
        let mut conn = self.pool.acquire().await?;
        Holder::all_ids(&mut conn).await
    }

    async fn stock_count(&self) -> RelayResult<i64> {
        let mut conn = self.pool.acquire().await?;
        NumberRecord::count(&mut conn).await
    }

    async fn add_numbers(&self, raw_values: &[String]) -> RelayResult<usize> {
        let mut tx = self.pool.begin().await?;
        let mut added = 0;
        for raw in raw_values {
            let Some(clean) = NumberRecord::clean_input(raw) else {
                continue;
            };
            if NumberRecord::insert_if_absent(clean, &mut tx).await? {
                added += 1;
            }
        }
        tx.commit().await?;
        Ok(added)
    }

    async fn remove_number(&self, raw_value: &str) -> RelayResult<bool> {
        let mut conn = self.pool.acquire().await?;
        NumberRecord::delete_by_value(raw_value.trim(), &mut conn).await
    }

    async fn clear_numbers(&self) -> RelayResult<u64> {
        let mut conn = self.pool.acquire().await?;
        NumberRecord::delete_all(&mut conn).await
    }

    async fn issue(
        &self,
        holder_id: HolderId,
        now: DateTime<Utc>,
        gate: &CooldownGate,
    ) -> RelayResult<IssueOutcome> {
        let mut tx = self.pool.begin().await?;
        Cooldown::lock_holder(holder_id, &mut tx).await?;

        let last = Cooldown::find_for_update(holder_id, &mut tx)
            .await?
            .map(|c| c.last_request_at);
        if let CooldownDecision::Denied { seconds_remaining } = gate.evaluate(last, now) {
            // Nothing written; dropping the transaction rolls back
            return Ok(IssueOutcome::Denied { seconds_remaining });
        }

        let Some(record) = NumberRecord::take_random(&mut tx).await? else {
            return Ok(IssueOutcome::OutOfStock);
        };

        Cooldown::record(holder_id, now, &mut tx).await?;
        let normalized = record.normalized();
        let displaced = Assignment::assign(&normalized, holder_id, now, &mut tx).await?;
        tx.commit().await?;

        let superseded = displaced
            .into_iter()
            .find(|a| a.holder_id == holder_id)
            .map(|a| a.normalized_number);
        debug!(holder_id = %holder_id, number = %normalized, "number issued");

        Ok(IssueOutcome::Issued(IssuedNumber {
            raw_value: record.raw_value,
            normalized,
            superseded,
        }))
    }

    async fn resolve(&self, number: &NormalizedNumber) -> RelayResult<Option<HolderId>> {
        let mut conn = self.pool.acquire().await?;
        Assignment::resolve(number, &mut conn).await
    }

    async fn assignment_for(&self, holder_id: HolderId) -> RelayResult<Option<Assignment>> {
        let mut conn = self.pool.acquire().await?;
        Assignment::find_by_holder(holder_id, &mut conn).await
    }

    async fn assignment_count(&self) -> RelayResult<i64> {
        let mut conn = self.pool.acquire().await?;
        Assignment::count(&mut conn).await
    }

    async fn settle_match(
        &self,
        number: &NormalizedNumber,
        holder_id: HolderId,
        credit: Money,
    ) -> RelayResult<bool> {
        let mut tx = self.pool.begin().await?;
        if !Assignment::lock_if_held_by(number, holder_id, &mut tx).await? {
            return Ok(false);
        }
        Balance::credit(holder_id, credit, &mut tx).await?;
        Assignment::clear(number, &mut tx).await?;
        tx.commit().await?;
        Ok(true)
    }

    async fn clear_assignment(&self, number: &NormalizedNumber) -> RelayResult<bool> {
        let mut conn = self.pool.acquire().await?;
        Assignment::clear(number, &mut conn).await
    }

    async fn expire_assignments(&self, cutoff: DateTime<Utc>) -> RelayResult<Vec<Assignment>> {
        let mut conn = self.pool.acquire().await?;
        Assignment::expire_issued_before(cutoff, &mut conn).await
    }

    async fn balance(&self, holder_id: HolderId) -> RelayResult<Money> {
        let mut conn = self.pool.acquire().await?;
        Balance::read(holder_id, &mut conn).await
    }

    async fn debit_if_sufficient(
        &self,
        holder_id: HolderId,
        amount: Money,
    ) -> RelayResult<DebitOutcome> {
        let mut conn = self.pool.acquire().await?;
        Balance::debit_if_sufficient(holder_id, amount, &mut conn).await
    }

    async fn record_withdrawal(
        &self,
        holder_id: HolderId,
        quote: &WithdrawalQuote,
        details: &str,
    ) -> RelayResult<WithdrawalRecord> {
        let mut tx = self.pool.begin().await?;
        let balance =
            match Balance::debit_if_sufficient(holder_id, quote.amount_base, &mut tx).await? {
                DebitOutcome::Debited { balance } => balance,
                DebitOutcome::InsufficientBalance { balance } => {
                    return Ok(WithdrawalRecord::InsufficientBalance { balance })
                }
            };
        let intent = WithdrawalIntent::insert(holder_id, quote, details, &mut tx).await?;
        tx.commit().await?;

        Ok(WithdrawalRecord::Recorded { intent, balance })
    }

    async fn withdrawals(&self, holder_id: HolderId) -> RelayResult<Vec<WithdrawalIntent>> {
        let mut conn = self.pool.acquire().await?;
        WithdrawalIntent::find_by_holder(holder_id, &mut conn).await
    }
}
