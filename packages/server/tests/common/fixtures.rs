//! Test fixtures shared by the integration tests.

use chrono::{DateTime, TimeZone, Utc};
use relay_core::config::RelaySettings;
use relay_core::kernel::{IssueOutcome, IssuedNumber};
use std::time::Duration;

/// Default settings without broadcast pacing.
pub fn quiet_settings() -> RelaySettings {
    RelaySettings {
        broadcast_delay: Duration::ZERO,
        ..RelaySettings::default()
    }
}

pub fn numbers(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

/// A fixed instant so cooldown arithmetic is exact.
pub fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 1, 1, 12, 0, 0).unwrap()
}

pub fn expect_issued(outcome: IssueOutcome) -> IssuedNumber {
    match outcome {
        IssueOutcome::Issued(issued) => issued,
        other => panic!("expected an issued number, got {:?}", other),
    }
}
