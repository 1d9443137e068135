//! Configuration for the token service

use chrono::Duration;
use pa_shared::config::{ConfigError, JwtConfig};

use crate::errors::TokenError;

/// Configuration for the token service
#[derive(Debug, Clone)]
pub struct TokenConfig {
    /// Secret for access tokens
    pub access_secret: String,
    /// Secret for refresh tokens
    pub refresh_secret: String,
    /// Access token lifetime
    pub access_ttl: Duration,
    /// Refresh token lifetime
    pub refresh_ttl: Duration,
    /// `iss` claim written and required on every token
    pub issuer: String,
}

impl TokenConfig {
    /// Config with the default lifetimes of one hour and seven days
    pub fn new(access_secret: impl Into<String>, refresh_secret: impl Into<String>) -> Self {
        Self {
            access_secret: access_secret.into(),
            refresh_secret: refresh_secret.into(),
            access_ttl: Duration::hours(1),
            refresh_ttl: Duration::days(7),
            issuer: "phone-auth".to_string(),
        }
    }

    pub fn with_access_ttl(mut self, ttl: Duration) -> Self {
        self.access_ttl = ttl;
        self
    }

    pub fn with_refresh_ttl(mut self, ttl: Duration) -> Self {
        self.refresh_ttl = ttl;
        self
    }

    pub fn with_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuer = issuer.into();
        self
    }

    /// Build from the shared JWT settings, parsing the lifetime strings
    pub fn from_jwt_config(jwt: &JwtConfig) -> Result<Self, TokenError> {
        Ok(Self {
            access_secret: jwt.access_secret.clone(),
            refresh_secret: jwt.refresh_secret.clone(),
            access_ttl: to_lifetime(jwt.access_ttl())?,
            refresh_ttl: to_lifetime(jwt.refresh_ttl())?,
            issuer: jwt.issuer.clone(),
        })
    }
}

fn to_lifetime(parsed: Result<std::time::Duration, ConfigError>) -> Result<Duration, TokenError> {
    let signing_error = |message: String| TokenError::SigningError { message };
    let std_duration = parsed.map_err(|e| signing_error(e.to_string()))?;
    Duration::from_std(std_duration).map_err(|e| signing_error(e.to_string()))
}
