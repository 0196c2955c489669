// Common types used across multiple domains and layers
//
// These types are shared between the kernel and domain layers to avoid
// circular dependencies while maintaining type safety.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Monetary amount, kept at two decimal places.
pub type Money = Decimal;

/// Round an amount to the two decimal places stored in `balances`.
pub fn round_money(amount: Money) -> Money {
    amount.round_dp(2)
}

/// Identifier of a holder (the chat user id on the transport side).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, sqlx::Type,
)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct HolderId(pub i64);

impl HolderId {
    pub fn as_i64(self) -> i64 {
        self.0
    }
}

impl From<i64> for HolderId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

impl fmt::Display for HolderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for HolderId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse::<i64>().map(Self)
    }
}
