//! Assignment directory - live bindings of normalized number to holder
//!
//! Invariants:
//! - at most one assignment per normalized number
//! - at most one assignment per holder (a new issuance supersedes the old one)
//!
//! Lifecycle is absent -> active -> absent. Removal happens on OTP match, on
//! supersession, on manual clear, or on the optional expiry sweep.

mod directory;
pub mod models;

pub use directory::{AssignmentDirectory, AssignOutcome};
pub use models::Assignment;
