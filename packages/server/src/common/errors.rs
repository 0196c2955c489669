use thiserror::Error;

/// Errors surfaced by the relay core.
///
/// Recoverable outcomes (out of stock, cooldown, insufficient balance) are
/// returned as values, not errors. What remains here is either a caller
/// mistake or a store failure the core cannot degrade around.
#[derive(Error, Debug)]
pub enum RelayError {
    #[error("Invalid number pattern: {0}")]
    InvalidPattern(#[from] regex::Error),

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Database error: {0}")]
    Store(#[from] sqlx::Error),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl RelayError {
    /// Store failures are fatal to the calling collaborator.
    pub fn is_fatal(&self) -> bool {
        matches!(self, RelayError::Store(_) | RelayError::Internal(_))
    }
}

pub type RelayResult<T> = Result<T, RelayError>;
