//! Configuration module with business-specific sub-modules
//!
//! This module organizes configuration into logical business areas:
//! - `auth` - Token signing and cookie transport configuration
//! - `otp` - One-time password generation and delivery gateway
//! - `database` - Database connection and user store selection
//! - `environment` - Environment detection
//! - `rate_limit` - Request throttling on the auth endpoints
//! - `server` - HTTP server and CORS configuration
//!
//! Every sub-configuration reads its values through a lookup function so the
//! same code serves both the process environment and test fixtures.

pub mod auth;
pub mod database;
pub mod environment;
pub mod otp;
pub mod rate_limit;
pub mod server;

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

// Re-export commonly used types
pub use auth::{CookieConfig, JwtConfig};
pub use database::{DatabaseConfig, StoreKind};
pub use environment::Environment;
pub use otp::{OtpConfig, OtpGatewayConfig, OtpMode};
pub use rate_limit::RateLimitConfig;
pub use server::{CorsConfig, ServerConfig};

/// Largest OTP length whose numeric range still fits in a `u64`.
pub const MAX_OTP_LENGTH: u32 = 18;

/// Errors raised while reading or validating configuration
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing required setting {0}")]
    Missing(&'static str),

    #[error("invalid value {value:?} for {key}")]
    Invalid { key: &'static str, value: String },

    #[error("invalid duration {value:?}, expected <n>s, <n>m, <n>h or <n>d")]
    InvalidDuration { value: String },

    #[error("invalid configuration: {0}")]
    Validation(String),
}

/// Source of raw setting values, keyed by variable name.
pub type Lookup<'a> = &'a dyn Fn(&str) -> Option<String>;

/// Read a variable from the process environment, treating blank values as unset.
pub fn env_lookup(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|value| !value.trim().is_empty())
}

/// Parse a setting, falling back to `default` when it is absent.
pub(crate) fn parse_or<T: FromStr>(
    lookup: Lookup<'_>,
    key: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match lookup(key) {
        Some(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid {
            key,
            value: raw,
        }),
        None => Ok(default),
    }
}

/// Complete application configuration combining all sub-configurations
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppConfig {
    /// Environment configuration
    pub environment: Environment,

    /// Server configuration
    pub server: ServerConfig,

    /// CORS configuration
    #[serde(default)]
    pub cors: CorsConfig,

    /// Database configuration
    pub database: DatabaseConfig,

    /// Which user store backs the service
    #[serde(default)]
    pub store: StoreKind,

    /// Token signing configuration
    pub jwt: JwtConfig,

    /// Credential cookie configuration
    pub cookie: CookieConfig,

    /// OTP generation configuration
    pub otp: OtpConfig,

    /// Remote OTP gateway configuration
    #[serde(default)]
    pub otp_gateway: OtpGatewayConfig,

    /// Rate limiting configuration
    pub rate_limit: RateLimitConfig,
}

impl AppConfig {
    /// Load configuration from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(&env_lookup)
    }

    /// Load configuration from an arbitrary key/value source
    pub fn from_lookup(lookup: Lookup<'_>) -> Result<Self, ConfigError> {
        let environment = Environment::from_lookup(lookup);

        Ok(Self {
            environment,
            server: ServerConfig::from_lookup(lookup)?,
            cors: CorsConfig::from_lookup(lookup)?,
            database: DatabaseConfig::from_lookup(lookup)?,
            store: parse_or(lookup, "USER_STORE", StoreKind::default())?,
            jwt: JwtConfig::from_lookup(lookup),
            cookie: CookieConfig::for_environment(environment),
            otp: OtpConfig::from_lookup(lookup, environment)?,
            otp_gateway: OtpGatewayConfig::from_lookup(lookup)?,
            rate_limit: RateLimitConfig::from_lookup(lookup)?,
        })
    }

    /// Check cross-field constraints that individual readers cannot.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.jwt.validate()?;
        self.otp.validate()?;
        self.rate_limit.validate()?;

        if self.otp.mode == OtpMode::Remote {
            self.otp_gateway.validate()?;
        }

        if self.store == StoreKind::MySql && self.database.url.trim().is_empty() {
            return Err(ConfigError::Missing("DATABASE_URL"));
        }

        Ok(())
    }
}
