//! Ledger configuration.
//!
//! Every knob has a default; the environment can override each one with a
//! `RENTBOOK_*` variable.

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const ENV_MAX_COMMIT_ATTEMPTS: &str = "RENTBOOK_MAX_COMMIT_ATTEMPTS";
pub const ENV_LOW_STOCK_THRESHOLD: &str = "RENTBOOK_LOW_STOCK_THRESHOLD";
pub const ENV_UPCOMING_WINDOW_DAYS: &str = "RENTBOOK_UPCOMING_WINDOW_DAYS";
pub const ENV_ALERT_LOOKAHEAD_DAYS: &str = "RENTBOOK_ALERT_LOOKAHEAD_DAYS";
pub const ENV_REMINDER_LEAD_DAYS: &str = "RENTBOOK_REMINDER_LEAD_DAYS";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("{key}: cannot parse '{value}' as a non-negative integer")]
    Malformed { key: &'static str, value: String },

    #[error("{key} must be at least 1")]
    OutOfRange { key: &'static str },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// Attempts per atomic operation before a version conflict is surfaced.
    pub max_commit_attempts: u32,
    /// Threshold given to items added without one.
    pub default_low_stock_threshold: u64,
    /// How far ahead "upcoming bookings" looks.
    pub upcoming_window_days: u64,
    /// How far ahead an event raises an "upcoming event" alert.
    pub alert_lookahead_days: u64,
    /// Days before an event its generated reminder falls due.
    pub reminder_lead_days: u64,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            max_commit_attempts: 3,
            default_low_stock_threshold: 10,
            upcoming_window_days: 7,
            alert_lookahead_days: 2,
            reminder_lead_days: 1,
        }
    }
}

impl LedgerConfig {
    /// Defaults overridden by `RENTBOOK_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Like [`from_env`](Self::from_env), reading variables through `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(v) = parse(&lookup, ENV_MAX_COMMIT_ATTEMPTS)? {
            config.max_commit_attempts = u32::try_from(v).map_err(|_| ConfigError::Malformed {
                key: ENV_MAX_COMMIT_ATTEMPTS,
                value: v.to_string(),
            })?;
        }
        if let Some(v) = parse(&lookup, ENV_LOW_STOCK_THRESHOLD)? {
            config.default_low_stock_threshold = v;
        }
        if let Some(v) = parse(&lookup, ENV_UPCOMING_WINDOW_DAYS)? {
            config.upcoming_window_days = v;
        }
        if let Some(v) = parse(&lookup, ENV_ALERT_LOOKAHEAD_DAYS)? {
            config.alert_lookahead_days = v;
        }
        if let Some(v) = parse(&lookup, ENV_REMINDER_LEAD_DAYS)? {
            config.reminder_lead_days = v;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_commit_attempts == 0 {
            return Err(ConfigError::OutOfRange {
                key: ENV_MAX_COMMIT_ATTEMPTS,
            });
        }
        Ok(())
    }
}

fn parse<F>(lookup: &F, key: &'static str) -> Result<Option<u64>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse::<u64>()
            .map(Some)
            .map_err(|_| ConfigError::Malformed { key, value: raw }),
    }
}
