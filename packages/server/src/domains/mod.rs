// Business domains
pub mod assignments;
pub mod cooldown;
pub mod ledger;
pub mod pool;
pub mod routing;
