//! Cooldown domain - per-holder rate limit on number requests
//!
//! The window opens at the last *successful* issuance. A denied attempt, or an
//! attempt that finds the pool empty, never moves it.

mod gate;
pub mod models;

pub use gate::{CooldownDecision, CooldownGate};
pub use models::Cooldown;
