//! Kernel module - storage, engine and infrastructure around the domains.

pub mod deps;
mod depletion;
pub mod engine;
pub mod ingest;
pub mod memory_store;
pub mod postgres_store;
pub mod scheduled_tasks;
pub mod store;
pub mod test_dependencies;
pub mod traits;

pub use depletion::DepletionLatch;
pub use deps::{LogNotifier, TelegramAdapter};
pub use engine::{BroadcastReport, RelayEngine, WithdrawalOutcome};
pub use ingest::{poll_channel_posts, spawn_channel_ingest, spawn_request_ingest, NumberRequest};
pub use memory_store::MemoryRelayStore;
pub use postgres_store::PostgresRelayStore;
pub use scheduled_tasks::start_scheduler;
pub use store::{IssueOutcome, IssuedNumber, RelayStore, WithdrawalRecord};
pub use test_dependencies::TestDependencies;
pub use traits::*;
