//! Server configuration read from the process environment.
//!
//! `.env` is loaded by the binary before [`WebConfig::from_env`] runs; values
//! already present in the environment win.

use chrono_tz::Tz;
use memo_core::text::time::DEFAULT_TIME_ZONE;
use memo_core::{default_log_level, parse_time_zone, LogSink, TimeZoneError};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::net::SocketAddr;

pub const ENV_DB_PATH: &str = "MEMO_DB_PATH";
pub const ENV_HTTP_ADDR: &str = "MEMO_HTTP_ADDR";
pub const ENV_TIME_ZONE: &str = "MEMO_TIME_ZONE";
pub const ENV_LOG_LEVEL: &str = "MEMO_LOG_LEVEL";
pub const ENV_LOG_DIR: &str = "MEMO_LOG_DIR";

pub const DEFAULT_DB_PATH: &str = "memo.db";
pub const DEFAULT_HTTP_ADDR: &str = "127.0.0.1:8000";

#[derive(Debug, Clone, PartialEq)]
pub struct WebConfig {
    pub db_path: String,
    pub http_addr: SocketAddr,
    /// Zone used when rendering created/updated timestamps.
    pub time_zone: Tz,
    pub log_level: String,
    pub log_sink: LogSink,
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidAddr { value: String },
    InvalidTimeZone(TimeZoneError),
    InvalidLogDir(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidAddr { value } => {
                write!(f, "{ENV_HTTP_ADDR} is not a socket address: `{value}`")
            }
            Self::InvalidTimeZone(err) => write!(f, "{ENV_TIME_ZONE}: {err}"),
            Self::InvalidLogDir(message) => write!(f, "{ENV_LOG_DIR}: {message}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidTimeZone(err) => Some(err),
            _ => None,
        }
    }
}

impl WebConfig {
    /// Reads configuration from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds configuration from an arbitrary key lookup.
    ///
    /// Unset and blank values fall back to defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let db_path = read(ENV_DB_PATH).unwrap_or_else(|| DEFAULT_DB_PATH.to_string());

        let raw_addr = read(ENV_HTTP_ADDR).unwrap_or_else(|| DEFAULT_HTTP_ADDR.to_string());
        let http_addr = raw_addr
            .parse::<SocketAddr>()
            .map_err(|_| ConfigError::InvalidAddr { value: raw_addr })?;

        let time_zone = parse_time_zone(
            read(ENV_TIME_ZONE)
                .as_deref()
                .unwrap_or(DEFAULT_TIME_ZONE),
        )
        .map_err(ConfigError::InvalidTimeZone)?;

        let log_level = read(ENV_LOG_LEVEL).unwrap_or_else(|| default_log_level().to_string());
        let log_sink = LogSink::from_optional_dir(read(ENV_LOG_DIR).as_deref())
            .map_err(ConfigError::InvalidLogDir)?;

        Ok(Self {
            db_path,
            http_addr,
            time_zone,
            log_level,
            log_sink,
        })
    }
}
