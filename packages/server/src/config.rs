use anyhow::{Context, Result};
use dotenvy::dotenv;
use rust_decimal::Decimal;
use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::common::Money;
use crate::domains::ledger::WithdrawalPolicy;

/// Default shape of a phone number quoted in channel text.
pub const DEFAULT_NUMBER_PATTERN: &str = r"\+?\d[ \d\-()]{6,}\d";

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub database_max_connections: u32,
    /// Only the `relay` binary needs a bot token.
    pub telegram_bot_token: Option<String>,
    pub operator_chat_id: i64,
    pub source_chat_id: Option<i64>,
    pub settings: RelaySettings,
}

/// Tunables for candidate extraction in channel text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionSettings {
    pub pattern: String,
    pub min_digits: usize,
    pub max_digits: usize,
}

impl Default for ExtractionSettings {
    fn default() -> Self {
        Self {
            pattern: DEFAULT_NUMBER_PATTERN.to_string(),
            min_digits: 8,
            max_digits: 15,
        }
    }
}

/// Immutable relay settings handed to component constructors.
#[derive(Debug, Clone)]
pub struct RelaySettings {
    /// Credit per routed OTP.
    pub otp_credit: Money,
    /// Window after a successful issuance during which the holder is denied.
    pub cooldown: chrono::Duration,
    pub extraction: ExtractionSettings,
    /// Unset means assignments never expire.
    pub assignment_ttl: Option<chrono::Duration>,
    /// Pause between broadcast sends.
    pub broadcast_delay: Duration,
    pub withdrawal: WithdrawalPolicy,
}

impl Default for RelaySettings {
    fn default() -> Self {
        Self {
            otp_credit: Decimal::new(60, 2),
            cooldown: chrono::Duration::seconds(15),
            extraction: ExtractionSettings::default(),
            assignment_ttl: None,
            broadcast_delay: Duration::from_millis(100),
            withdrawal: WithdrawalPolicy::default(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();

        Ok(Self {
            database_url: env::var("DATABASE_URL").context("DATABASE_URL must be set")?,
            database_max_connections: parse_or("DATABASE_MAX_CONNECTIONS", 10)?,
            telegram_bot_token: env::var("TELEGRAM_BOT_TOKEN").ok(),
            operator_chat_id: env::var("OPERATOR_CHAT_ID")
                .context("OPERATOR_CHAT_ID must be set")?
                .parse()
                .context("OPERATOR_CHAT_ID must be a valid chat id")?,
            source_chat_id: parse_optional("SOURCE_CHAT_ID")?,
            settings: RelaySettings::from_env()?,
        })
    }

    /// Bot token, required by anything that talks to the transport.
    pub fn require_bot_token(&self) -> Result<&str> {
        self.telegram_bot_token
            .as_deref()
            .context("TELEGRAM_BOT_TOKEN must be set")
    }
}

impl RelaySettings {
    /// Read overrides from the environment, keeping defaults for unset vars.
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();
        let extraction_defaults = ExtractionSettings::default();
        let withdrawal_defaults = WithdrawalPolicy::default();

        let extraction = ExtractionSettings {
            pattern: env::var("NUMBER_PATTERN").unwrap_or(extraction_defaults.pattern),
            min_digits: parse_or("NUMBER_MIN_DIGITS", extraction_defaults.min_digits)?,
            max_digits: parse_or("NUMBER_MAX_DIGITS", extraction_defaults.max_digits)?,
        };
        anyhow::ensure!(
            extraction.min_digits <= extraction.max_digits,
            "NUMBER_MIN_DIGITS must not exceed NUMBER_MAX_DIGITS"
        );

        let cooldown_seconds: i64 = parse_or("COOLDOWN_SECONDS", defaults.cooldown.num_seconds())?;
        let ttl_seconds: Option<i64> = parse_optional("ASSIGNMENT_TTL_SECONDS")?;
        let delay_ms: u64 = parse_or("BROADCAST_DELAY_MS", defaults.broadcast_delay.as_millis() as u64)?;

        Ok(Self {
            otp_credit: parse_or("OTP_CREDIT", defaults.otp_credit)?,
            cooldown: seconds_setting("COOLDOWN_SECONDS", cooldown_seconds)?,
            extraction,
            assignment_ttl: match ttl_seconds {
                Some(seconds) => {
                    anyhow::ensure!(seconds > 0, "ASSIGNMENT_TTL_SECONDS must be positive");
                    Some(seconds_setting("ASSIGNMENT_TTL_SECONDS", seconds)?)
                }
                None => None,
            },
            broadcast_delay: Duration::from_millis(delay_ms),
            withdrawal: WithdrawalPolicy {
                usd_rate: parse_or("USD_TO_BDT_RATE", withdrawal_defaults.usd_rate)?,
                min_recharge: parse_or("MIN_WITHDRAW_RECHARGE", withdrawal_defaults.min_recharge)?,
                min_rocket: parse_or("MIN_WITHDRAW_ROCKET", withdrawal_defaults.min_rocket)?,
                min_binance_usd: parse_or(
                    "MIN_WITHDRAW_BINANCE_USD",
                    withdrawal_defaults.min_binance_usd,
                )?,
            },
        })
    }
}

/// A non-negative whole-second setting as a chrono duration.
fn seconds_setting(name: &str, seconds: i64) -> Result<chrono::Duration> {
    anyhow::ensure!(seconds >= 0, "{} must not be negative", name);
    chrono::Duration::try_seconds(seconds).with_context(|| format!("{} is out of range", name))
}

fn parse_or<T>(name: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(name) {
        Ok(value) => value
            .trim()
            .parse()
            .with_context(|| format!("{} has an invalid value", name)),
        Err(_) => Ok(default),
    }
}

fn parse_optional<T>(name: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(name) {
        Ok(value) if !value.trim().is_empty() => value
            .trim()
            .parse()
            .map(Some)
            .with_context(|| format!("{} has an invalid value", name)),
        _ => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_published_rates() {
        let settings = RelaySettings::default();
        assert_eq!(settings.otp_credit, Decimal::new(60, 2));
        assert_eq!(settings.cooldown.num_seconds(), 15);
        assert_eq!(settings.extraction.min_digits, 8);
        assert_eq!(settings.extraction.max_digits, 15);
        assert!(settings.assignment_ttl.is_none());
    }

    #[test]
    fn test_seconds_setting_rejects_negative_and_out_of_range() {
        assert_eq!(
            seconds_setting("COOLDOWN_SECONDS", 15).unwrap(),
            chrono::Duration::seconds(15)
        );
        assert!(seconds_setting("COOLDOWN_SECONDS", -1).is_err());
        let err = seconds_setting("COOLDOWN_SECONDS", 9_999_999_999_999_999).unwrap_err();
        assert!(err.to_string().contains("COOLDOWN_SECONDS"));
    }

    #[test]
    fn test_parse_or_uses_default_when_unset() {
        let value: u32 = parse_or("RELAY_TEST_SURELY_UNSET_VAR", 7).unwrap();
        assert_eq!(value, 7);
        let missing: Option<i64> = parse_optional("RELAY_TEST_SURELY_UNSET_VAR").unwrap();
        assert!(missing.is_none());
    }
}
