use serde::{Deserialize, Serialize};
use std::fmt;

/// Digits-only projection of a phone number.
///
/// This is the join key between numbers in the pool and numbers quoted in
/// channel text, which rarely agree on punctuation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, sqlx::Type)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct NormalizedNumber(String);

impl NormalizedNumber {
    /// Strip every non-digit character from `raw`.
    pub fn from_raw(raw: &str) -> Self {
        Self(raw.chars().filter(|c| c.is_ascii_digit()).collect())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn digit_count(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// True when the digit count lies inside `[min, max]`.
    pub fn within_band(&self, min: usize, max: usize) -> bool {
        (min..=max).contains(&self.digit_count())
    }
}

impl fmt::Display for NormalizedNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
