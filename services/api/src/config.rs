//! services/api/src/config.rs
//!
//! Defines the application's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use chrono::{FixedOffset, NaiveTime};
use std::net::SocketAddr;
use tracing::Level;
use zenstudy_core::BlackoutWindow;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing the environment variable {0}")]
    MissingVar(String),
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    pub database_url: String,
    pub log_level: Level,
    /// The institution's fixed UTC offset; every computation of "today"
    /// goes through this one offset.
    pub utc_offset: FixedOffset,
    /// Time-of-day range during which check-in is rejected.
    pub blackout: BlackoutWindow,
    /// Shared admin passphrase for the report/reset endpoints. Not a real
    /// security boundary; a single gate for a single shared screen.
    pub admin_key: String,
    pub cors_origin: String,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Only load from .env in non-test mode to avoid contamination.
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }

        // --- Load Server and Database Settings ---
        let bind_address_str =
            std::env::var("BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
        let bind_address = bind_address_str
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::InvalidValue("BIND_ADDRESS".to_string(), e.to_string()))?;

        let database_url = std::env::var("DATABASE_URL")
            .map_err(|_| ConfigError::MissingVar("DATABASE_URL".to_string()))?;

        let log_level_str = std::env::var("RUST_LOG").unwrap_or_else(|_| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        // --- Load Attendance Policy Settings ---
        let offset_str = std::env::var("UTC_OFFSET").unwrap_or_else(|_| "+05:30".to_string());
        let utc_offset = parse_utc_offset(&offset_str)
            .ok_or_else(|| ConfigError::InvalidValue("UTC_OFFSET".to_string(), offset_str))?;

        let blackout_start = parse_time_var("BLACKOUT_START", "00:00")?;
        let blackout_end = parse_time_var("BLACKOUT_END", "03:00")?;
        let blackout = BlackoutWindow::new(blackout_start, blackout_end);

        let admin_key = std::env::var("ADMIN_KEY")
            .map_err(|_| ConfigError::MissingVar("ADMIN_KEY".to_string()))?;

        let cors_origin =
            std::env::var("CORS_ORIGIN").unwrap_or_else(|_| "http://localhost:5173".to_string());

        Ok(Self {
            bind_address,
            database_url,
            log_level,
            utc_offset,
            blackout,
            admin_key,
            cors_origin,
        })
    }
}

/// Parses an offset of the form "+05:30" or "-03:00".
fn parse_utc_offset(s: &str) -> Option<FixedOffset> {
    let (sign, rest) = match s.as_bytes().first()? {
        b'+' => (1, &s[1..]),
        b'-' => (-1, &s[1..]),
        _ => (1, s),
    };
    let (hours, minutes) = rest.split_once(':')?;
    let hours: i32 = hours.parse().ok()?;
    let minutes: i32 = minutes.parse().ok()?;
    if hours > 23 || minutes > 59 {
        return None;
    }
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
}

fn parse_time_var(name: &str, default: &str) -> Result<NaiveTime, ConfigError> {
    let value = std::env::var(name).unwrap_or_else(|_| default.to_string());
    NaiveTime::parse_from_str(&value, "%H:%M")
        .map_err(|e| ConfigError::InvalidValue(name.to_string(), e.to_string()))
}
