use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

/// Result of gating a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum CooldownDecision {
    Allowed,
    /// Whole seconds until the window closes, rounded up (never 0).
    Denied { seconds_remaining: i64 },
}

impl CooldownDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, CooldownDecision::Allowed)
    }
}

/// Fixed-window gate. Stateless: the caller supplies the last issuance time
/// and commits the new one only after the pool produced a number.
#[derive(Debug, Clone, Copy)]
pub struct CooldownGate {
    window: Duration,
}

impl CooldownGate {
    pub fn new(window: Duration) -> Self {
        Self { window }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    pub fn evaluate(&self, last_request_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> CooldownDecision {
        let Some(last) = last_request_at else {
            return CooldownDecision::Allowed;
        };

        let elapsed = now - last;
        if elapsed >= self.window {
            return CooldownDecision::Allowed;
        }

        let remaining_ms = (self.window - elapsed).num_milliseconds().max(1);
        CooldownDecision::Denied {
            seconds_remaining: (remaining_ms + 999) / 1000,
        }
    }
}
