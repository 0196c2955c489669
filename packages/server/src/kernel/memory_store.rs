// In-memory RelayStore
//
// All tables sit behind one async mutex, so every operation is a single
// critical section. Used by tests and by embedders that do not need
// persistence.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::HashMap;
use tokio::sync::Mutex;

use super::store::{IssueOutcome, IssuedNumber, RelayStore, WithdrawalRecord};
use crate::common::{HolderId, Money, NormalizedNumber, RelayResult};
use crate::domains::assignments::{Assignment, AssignmentDirectory};
use crate::domains::cooldown::{CooldownDecision, CooldownGate};
use crate::domains::ledger::{
    BalanceLedger, DebitOutcome, HolderRegistry, WithdrawalIntent, WithdrawalQuote,
};
use crate::domains::pool::NumberPool;

struct Tables {
    pool: NumberPool,
    directory: AssignmentDirectory,
    cooldowns: HashMap<HolderId, DateTime<Utc>>,
    ledger: BalanceLedger,
    holders: HolderRegistry,
    withdrawals: Vec<WithdrawalIntent>,
    rng: StdRng,
}

pub struct MemoryRelayStore {
    tables: Mutex<Tables>,
}

impl MemoryRelayStore {
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    /// Deterministic pool selection, for tests.
    pub fn with_seed(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    fn with_rng(rng: StdRng) -> Self {
        Self {
            tables: Mutex::new(Tables {
                pool: NumberPool::new(),
                directory: AssignmentDirectory::new(),
                cooldowns: HashMap::new(),
                ledger: BalanceLedger::new(),
                holders: HolderRegistry::new(),
                withdrawals: Vec::new(),
                rng,
            }),
        }
    }
}

impl Default for MemoryRelayStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RelayStore for MemoryRelayStore {
    async fn register_holder(&self, holder_id: HolderId) -> RelayResult<bool> {
        let mut t = self.tables.lock().await;
        t.ledger.open(holder_id);
        Ok(t.holders.register(holder_id))
    }

    async fn holders(&self) -> RelayResult<Vec<HolderId>> {
        Ok(self.tables.lock().await.holders.all())
    }

    async fn stock_count(&self) -> RelayResult<i64> {
        Ok(self.tables.lock().await.pool.count() as i64)
    }

    async fn add_numbers(&self, raw_values: &[String]) -> RelayResult<usize> {
        let mut t = self.tables.lock().await;
        Ok(raw_values.iter().filter(|raw| t.pool.add(raw)).count())
    }

    async fn remove_number(&self, raw_value: &str) -> RelayResult<bool> {
        Ok(self.tables.lock().await.pool.remove(raw_value))
    }

    async fn clear_numbers(&self) -> RelayResult<u64> {
        Ok(self.tables.lock().await.pool.clear() as u64)
    }

    async fn issue(
        &self,
        holder_id: HolderId,
        now: DateTime<Utc>,
        gate: &CooldownGate,
    ) -> RelayResult<IssueOutcome> {
        let mut guard = self.tables.lock().await;
        let t = &mut *guard;

        let last = t.cooldowns.get(&holder_id).copied();
        if let CooldownDecision::Denied { seconds_remaining } = gate.evaluate(last, now) {
            return Ok(IssueOutcome::Denied { seconds_remaining });
        }

        let Some(record) = t.pool.take_random(&mut t.rng) else {
            return Ok(IssueOutcome::OutOfStock);
        };

        t.cooldowns.insert(holder_id, now);
        let normalized = record.normalized();
        let outcome = t.directory.assign(normalized.clone(), holder_id, now);

        Ok(IssueOutcome::Issued(IssuedNumber {
            raw_value: record.raw_value,
            normalized,
            superseded: outcome.superseded.map(|a| a.normalized_number),
        }))
    }

    async fn resolve(&self, number: &NormalizedNumber) -> RelayResult<Option<HolderId>> {
        Ok(self.tables.lock().await.directory.resolve(number))
    }

    async fn assignment_for(&self, holder_id: HolderId) -> RelayResult<Option<Assignment>> {
        Ok(self.tables.lock().await.directory.for_holder(holder_id).cloned())
    }

    async fn assignment_count(&self) -> RelayResult<i64> {
        Ok(self.tables.lock().await.directory.len() as i64)
    }

    async fn settle_match(
        &self,
        number: &NormalizedNumber,
        holder_id: HolderId,
        credit: Money,
    ) -> RelayResult<bool> {
        let mut t = self.tables.lock().await;
        if t.directory.resolve(number) != Some(holder_id) {
            return Ok(false);
        }
        t.ledger.credit(holder_id, credit);
        t.directory.clear(number);
        Ok(true)
    }

    async fn clear_assignment(&self, number: &NormalizedNumber) -> RelayResult<bool> {
        Ok(self.tables.lock().await.directory.clear(number).is_some())
    }

    async fn expire_assignments(&self, cutoff: DateTime<Utc>) -> RelayResult<Vec<Assignment>> {
        Ok(self.tables.lock().await.directory.expire_issued_before(cutoff))
    }

    async fn balance(&self, holder_id: HolderId) -> RelayResult<Money> {
        Ok(self.tables.lock().await.ledger.read(holder_id))
    }

    async fn debit_if_sufficient(
        &self,
        holder_id: HolderId,
        amount: Money,
    ) -> RelayResult<DebitOutcome> {
        Ok(self
            .tables
            .lock()
            .await
            .ledger
            .debit_if_sufficient(holder_id, amount))
    }

    async fn record_withdrawal(
        &self,
        holder_id: HolderId,
        quote: &WithdrawalQuote,
        details: &str,
    ) -> RelayResult<WithdrawalRecord> {
        let mut t = self.tables.lock().await;
        let balance = match t.ledger.debit_if_sufficient(holder_id, quote.amount_base) {
            DebitOutcome::Debited { balance } => balance,
            DebitOutcome::InsufficientBalance { balance } => {
                return Ok(WithdrawalRecord::InsufficientBalance { balance })
            }
        };

        let intent = WithdrawalIntent {
            id: t.withdrawals.len() as i64 + 1,
            holder_id,
            method: quote.method.as_str().to_string(),
            details: details.to_string(),
            amount: quote.amount,
            amount_base: quote.amount_base,
            created_at: Utc::now(),
        };
        t.withdrawals.push(intent.clone());

        Ok(WithdrawalRecord::Recorded { intent, balance })
    }

    async fn withdrawals(&self, holder_id: HolderId) -> RelayResult<Vec<WithdrawalIntent>> {
        let t = self.tables.lock().await;
        Ok(t.withdrawals
            .iter()
            .rev()
            .filter(|w| w.holder_id == holder_id)
            .cloned()
            .collect())
    }
}
