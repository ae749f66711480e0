//! Process configuration from environment variables.
//!
//! | Variable | Default |
//! |---|---|
//! | `GATEKEEPER_BIND_ADDR` | `0.0.0.0:8080` |
//! | `GATEKEEPER_HANDLER_TIMEOUT_MS` | `30000` (`0` disables) |
//! | `GATEKEEPER_EXPOSE_HANDLER_ERRORS` | `false` |
//! | `GATEKEEPER_LOG_FORMAT` | `json` |

use std::net::SocketAddr;
use std::time::Duration;

use thiserror::Error;

use gatekeeper_observability::LogFormat;
use gatekeeper_router::Disclosure;

pub const BIND_ADDR: &str = "GATEKEEPER_BIND_ADDR";
pub const HANDLER_TIMEOUT_MS: &str = "GATEKEEPER_HANDLER_TIMEOUT_MS";
pub const EXPOSE_HANDLER_ERRORS: &str = "GATEKEEPER_EXPOSE_HANDLER_ERRORS";
pub const LOG_FORMAT: &str = "GATEKEEPER_LOG_FORMAT";

const DEFAULT_HANDLER_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid {key}='{value}': {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub bind_addr: SocketAddr,
    /// Upper bound for a single handler call; `None` waits indefinitely.
    pub handler_timeout: Option<Duration>,
    /// Include handler error detail in response bodies (never enable for
    /// untrusted callers).
    pub expose_handler_errors: bool,
    pub log_format: LogFormat,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            handler_timeout: Some(DEFAULT_HANDLER_TIMEOUT),
            expose_handler_errors: false,
            log_format: LogFormat::Json,
        }
    }
}

impl Settings {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from any key lookup; unset keys keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut settings = Self::default();

        if let Some(raw) = lookup(BIND_ADDR) {
            settings.bind_addr = raw
                .trim()
                .parse()
                .map_err(|e: std::net::AddrParseError| invalid(BIND_ADDR, &raw, e))?;
        }

        if let Some(raw) = lookup(HANDLER_TIMEOUT_MS) {
            let ms: u64 = raw
                .trim()
                .parse()
                .map_err(|e: std::num::ParseIntError| invalid(HANDLER_TIMEOUT_MS, &raw, e))?;
            settings.handler_timeout = (ms > 0).then(|| Duration::from_millis(ms));
        }

        if let Some(raw) = lookup(EXPOSE_HANDLER_ERRORS) {
            settings.expose_handler_errors = parse_bool(&raw)
                .ok_or_else(|| invalid(EXPOSE_HANDLER_ERRORS, &raw, "expected true or false"))?;
        }

        if let Some(raw) = lookup(LOG_FORMAT) {
            settings.log_format = raw.parse().map_err(|e| invalid(LOG_FORMAT, &raw, e))?;
        }

        Ok(settings)
    }

    pub fn disclosure(&self) -> Disclosure {
        if self.expose_handler_errors {
            Disclosure::Verbose
        } else {
            Disclosure::Redacted
        }
    }
}

fn invalid(key: &'static str, value: &str, reason: impl ToString) -> ConfigError {
    ConfigError::Invalid {
        key,
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
