use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::HashMap;

use crate::common::{HolderId, Money};

/// Result of a guarded debit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DebitOutcome {
    Debited { balance: Money },
    InsufficientBalance { balance: Money },
}

/// In-process balance ledger.
///
/// `credit` and `debit` are plain additive adjustments; callers that need a
/// floor use [`BalanceLedger::debit_if_sufficient`].
#[derive(Debug, Default)]
pub struct BalanceLedger {
    balances: HashMap<HolderId, Money>,
}

impl BalanceLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a zero account if none exists.
    pub fn open(&mut self, holder_id: HolderId) {
        self.balances.entry(holder_id).or_insert(Decimal::ZERO);
    }

    pub fn read(&self, holder_id: HolderId) -> Money {
        self.balances.get(&holder_id).copied().unwrap_or(Decimal::ZERO)
    }

    pub fn credit(&mut self, holder_id: HolderId, amount: Money) -> Money {
        let balance = self.balances.entry(holder_id).or_insert(Decimal::ZERO);
        *balance += amount;
        *balance
    }

    pub fn debit(&mut self, holder_id: HolderId, amount: Money) -> Money {
        self.credit(holder_id, -amount)
    }

    pub fn debit_if_sufficient(&mut self, holder_id: HolderId, amount: Money) -> DebitOutcome {
        let balance = self.read(holder_id);
        if balance < amount {
            return DebitOutcome::InsufficientBalance { balance };
        }
        DebitOutcome::Debited {
            balance: self.debit(holder_id, amount),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_holder_reads_zero() {
        assert_eq!(BalanceLedger::new().read(HolderId(9)), Decimal::ZERO);
    }

    #[test]
    fn test_debit_does_not_clamp() {
        let mut ledger = BalanceLedger::new();
        ledger.credit(HolderId(1), Decimal::new(60, 2));
        assert_eq!(ledger.debit(HolderId(1), Decimal::ONE), Decimal::new(-40, 2));
    }

    #[test]
    fn test_guarded_debit_leaves_balance_on_refusal() {
        let mut ledger = BalanceLedger::new();
        ledger.credit(HolderId(1), Decimal::new(120, 2));

        let refused = ledger.debit_if_sufficient(HolderId(1), Decimal::new(2, 0));
        assert_eq!(
            refused,
            DebitOutcome::InsufficientBalance {
                balance: Decimal::new(120, 2)
            }
        );
        assert_eq!(ledger.read(HolderId(1)), Decimal::new(120, 2));

        let taken = ledger.debit_if_sufficient(HolderId(1), Decimal::new(120, 2));
        assert_eq!(taken, DebitOutcome::Debited { balance: Decimal::ZERO });
    }

    #[test]
    fn test_open_keeps_existing_balance() {
        let mut ledger = BalanceLedger::new();
        ledger.credit(HolderId(1), Decimal::ONE);
        ledger.open(HolderId(1));
        assert_eq!(ledger.read(HolderId(1)), Decimal::ONE);
    }
}
