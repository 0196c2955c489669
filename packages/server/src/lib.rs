// Number Relay - Core
//
// Hands out phone numbers from an operator-managed pool, watches a source
// channel for OTP messages quoting those numbers, and forwards each match to
// the holder while crediting their balance.
//
// Pure state machines live in domains/*; persistence, orchestration and the
// transport seam live in kernel/.

pub mod common;
pub mod config;
pub mod domains;
pub mod kernel;

pub use config::*;
