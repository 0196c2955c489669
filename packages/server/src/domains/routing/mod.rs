//! Routing domain - matches channel text against live assignments
//!
//! Flow per inbound message:
//!   extract candidates -> resolve holder -> settle (credit, then clear) -> DeliveryEvent
//!
//! Every candidate in a message is processed; unmatched candidates are dropped.

mod extractor;
mod router;

pub use extractor::{Candidate, NumberExtractor};
pub use router::{DeliveryEvent, OtpRouter};
