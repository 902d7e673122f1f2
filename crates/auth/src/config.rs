//! Signing configuration for access and refresh tokens.
//!
//! Built once at startup and handed to [`crate::TokenService`]. Invalid
//! configuration is reported here so it never surfaces per request.

use chrono::Duration;
use thiserror::Error;

pub const DEFAULT_ACCESS_TTL_HOURS: i64 = 1;
pub const DEFAULT_REFRESH_TTL_DAYS: i64 = 7;
pub const REFRESH_CLOCK_SKEW_SECS: i64 = 30;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing configuration value: {0}")]
    Missing(&'static str),

    #[error("invalid configuration value for {key}: {reason}")]
    Invalid { key: &'static str, reason: String },

    #[error("access and refresh tokens must be signed with different secrets")]
    SharedSecret,
}

#[derive(Clone)]
pub struct TokenConfig {
    access_secret: String,
    refresh_secret: String,
    issuer: String,
    audience: String,
    access_ttl: Duration,
    refresh_ttl: Duration,
    access_leeway: Duration,
    refresh_leeway: Duration,
}

impl TokenConfig {
    /// Required values; lifetimes and clock-skew tolerances start at their defaults.
    pub fn new(
        access_secret: impl Into<String>,
        refresh_secret: impl Into<String>,
        issuer: impl Into<String>,
        audience: impl Into<String>,
    ) -> Result<Self, ConfigError> {
        let access_secret = required("JWT_KEY", access_secret.into())?;
        let refresh_secret = required("JWT_REFRESH_SECRET", refresh_secret.into())?;
        let issuer = required("JWT_ISSUER", issuer.into())?;
        let audience = required("JWT_AUDIENCE", audience.into())?;

        if access_secret == refresh_secret {
            return Err(ConfigError::SharedSecret);
        }

        Ok(Self {
            access_secret,
            refresh_secret,
            issuer,
            audience,
            access_ttl: Duration::hours(DEFAULT_ACCESS_TTL_HOURS),
            refresh_ttl: Duration::days(DEFAULT_REFRESH_TTL_DAYS),
            access_leeway: Duration::zero(),
            refresh_leeway: Duration::seconds(REFRESH_CLOCK_SKEW_SECS),
        })
    }

    pub fn with_access_ttl(mut self, ttl: Duration) -> Result<Self, ConfigError> {
        self.access_ttl = positive("JWT_EXPIRES_HOURS", ttl)?;
        Ok(self)
    }

    pub fn with_refresh_ttl(mut self, ttl: Duration) -> Result<Self, ConfigError> {
        self.refresh_ttl = positive("JWT_REFRESH_EXPIRES_DAYS", ttl)?;
        Ok(self)
    }

    pub fn with_access_leeway(mut self, leeway: Duration) -> Result<Self, ConfigError> {
        self.access_leeway = non_negative("JWT_ACCESS_CLOCK_SKEW_SECS", leeway)?;
        Ok(self)
    }

    pub fn with_refresh_leeway(mut self, leeway: Duration) -> Result<Self, ConfigError> {
        self.refresh_leeway = non_negative("JWT_REFRESH_CLOCK_SKEW_SECS", leeway)?;
        Ok(self)
    }

    pub(crate) fn access_secret(&self) -> &[u8] {
        self.access_secret.as_bytes()
    }

    pub(crate) fn refresh_secret(&self) -> &[u8] {
        self.refresh_secret.as_bytes()
    }

    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    pub fn audience(&self) -> &str {
        &self.audience
    }

    pub fn access_ttl(&self) -> Duration {
        self.access_ttl
    }

    pub fn refresh_ttl(&self) -> Duration {
        self.refresh_ttl
    }

    pub fn access_leeway(&self) -> Duration {
        self.access_leeway
    }

    pub fn refresh_leeway(&self) -> Duration {
        self.refresh_leeway
    }
}

impl core::fmt::Debug for TokenConfig {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("TokenConfig")
            .field("access_secret", &"<redacted>")
            .field("refresh_secret", &"<redacted>")
            .field("issuer", &self.issuer)
            .field("audience", &self.audience)
            .field("access_ttl", &self.access_ttl)
            .field("refresh_ttl", &self.refresh_ttl)
            .field("access_leeway", &self.access_leeway)
            .field("refresh_leeway", &self.refresh_leeway)
            .finish()
    }
}

fn required(key: &'static str, value: String) -> Result<String, ConfigError> {
    if value.trim().is_empty() {
        Err(ConfigError::Missing(key))
    } else {
        Ok(value)
    }
}

fn positive(key: &'static str, value: Duration) -> Result<Duration, ConfigError> {
    if value <= Duration::zero() {
        return Err(ConfigError::Invalid {
            key,
            reason: "must be greater than zero".to_string(),
        });
    }
    Ok(value)
}

fn non_negative(key: &'static str, value: Duration) -> Result<Duration, ConfigError> {
    if value < Duration::zero() {
        return Err(ConfigError::Invalid {
            key,
            reason: "must not be negative".to_string(),
        });
    }
    Ok(value)
}
