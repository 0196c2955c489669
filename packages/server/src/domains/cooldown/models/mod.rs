pub mod cooldown;

pub use cooldown::Cooldown;
