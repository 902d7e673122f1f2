//! Process configuration.
//!
//! Read once at startup from the environment (a `.env` file is honoured by
//! `main`). Any invalid value is fatal: the server never starts with a
//! partially usable token setup.
//!
//! | Variable | Default |
//! |----------|---------|
//! | `JWT_KEY` | required |
//! | `JWT_REFRESH_SECRET` | required, must differ from `JWT_KEY` |
//! | `JWT_ISSUER` | required |
//! | `JWT_AUDIENCE` | required |
//! | `JWT_EXPIRES_HOURS` | `1` |
//! | `JWT_REFRESH_EXPIRES_DAYS` | `7` |
//! | `JWT_ACCESS_CLOCK_SKEW_SECS` | `0` |
//! | `JWT_REFRESH_CLOCK_SKEW_SECS` | `30` |
//! | `APP_ENV` | `production` |
//! | `BIND_ADDR` | `0.0.0.0:8080` |
//! | `DATABASE_URL` | unset (in-memory directory) |

use chrono::Duration;

use portal_auth::{ConfigError, TokenConfig};
use portal_observability::LogFormat;

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";

/// Deployment mode; development enables diagnostic error bodies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunMode {
    Development,
    #[default]
    Production,
}

impl RunMode {
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => RunMode::Development,
            _ => RunMode::Production,
        }
    }

    pub fn is_development(self) -> bool {
        self == RunMode::Development
    }

    pub fn log_format(self) -> LogFormat {
        match self {
            RunMode::Development => LogFormat::Pretty,
            RunMode::Production => LogFormat::Json,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub bind_addr: String,
    pub mode: RunMode,
    pub database_url: Option<String>,
    pub tokens: TokenConfig,
}

impl ApiConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup; blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let mut tokens = TokenConfig::new(
            get("JWT_KEY").unwrap_or_default(),
            get("JWT_REFRESH_SECRET").unwrap_or_default(),
            get("JWT_ISSUER").unwrap_or_default(),
            get("JWT_AUDIENCE").unwrap_or_default(),
        )?;

        if let Some(raw) = get("JWT_EXPIRES_HOURS") {
            tokens = tokens.with_access_ttl(lifetime("JWT_EXPIRES_HOURS", &raw, 3_600.0)?)?;
        }
        if let Some(raw) = get("JWT_REFRESH_EXPIRES_DAYS") {
            tokens = tokens.with_refresh_ttl(lifetime("JWT_REFRESH_EXPIRES_DAYS", &raw, 86_400.0)?)?;
        }
        if let Some(raw) = get("JWT_ACCESS_CLOCK_SKEW_SECS") {
            tokens = tokens.with_access_leeway(lifetime("JWT_ACCESS_CLOCK_SKEW_SECS", &raw, 1.0)?)?;
        }
        if let Some(raw) = get("JWT_REFRESH_CLOCK_SKEW_SECS") {
            tokens = tokens.with_refresh_leeway(lifetime("JWT_REFRESH_CLOCK_SKEW_SECS", &raw, 1.0)?)?;
        }

        Ok(Self {
            bind_addr: get("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string()),
            mode: get("APP_ENV").map(|v| RunMode::parse(&v)).unwrap_or_default(),
            database_url: get("DATABASE_URL"),
            tokens,
        })
    }
}

/// Fractional amount of `unit_secs`, e.g. `"0.5"` hours.
fn lifetime(key: &'static str, raw: &str, unit_secs: f64) -> Result<Duration, ConfigError> {
    let amount = raw
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| ConfigError::Invalid {
            key,
            reason: format!("expected a number, got {raw:?}"),
        })?;

    Duration::try_seconds((amount * unit_secs).round() as i64).ok_or_else(|| ConfigError::Invalid {
        key,
        reason: format!("{raw} is out of range"),
    })
}
