pub mod number;

pub use number::NumberRecord;
