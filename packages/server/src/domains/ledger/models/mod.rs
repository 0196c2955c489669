pub mod balance;
pub mod holder;
pub mod withdrawal;

pub use balance::Balance;
pub use holder::Holder;
pub use withdrawal::WithdrawalIntent;
