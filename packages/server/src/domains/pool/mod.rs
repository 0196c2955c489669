//! Number pool - unassigned numbers waiting to be issued
//!
//! Responsibilities:
//! - Stock count and admin maintenance (add, remove, clear)
//! - Uniform random withdrawal that removes the chosen record in the same step

pub mod models;
mod stock;

pub use models::NumberRecord;
pub use stock::NumberPool;
