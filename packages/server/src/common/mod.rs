// Common types and utilities shared across the application

pub mod errors;
pub mod phone;
pub mod types;

pub use errors::{RelayError, RelayResult};
pub use phone::NormalizedNumber;
pub use types::*;
