//! Ledger domain - balances, the holder registry and withdrawal intents
//!
//! Credits come from OTP routing, debits from the withdrawal collaborator.
//! A debit only lands when the balance covers it, checked in the same step.

mod accounts;
mod holders;
pub mod models;
mod withdrawal;

pub use accounts::{BalanceLedger, DebitOutcome};
pub use holders::HolderRegistry;
pub use models::{Balance, Holder, WithdrawalIntent};
pub use withdrawal::{Currency, QuoteRefusal, WithdrawalMethod, WithdrawalPolicy, WithdrawalQuote};
