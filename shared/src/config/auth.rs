//! Token signing and credential cookie configuration

use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::{ConfigError, Environment, Lookup};
use crate::utils::duration::parse_duration;

/// JWT signing configuration.
///
/// Access and refresh tokens are signed with independent secrets so that a
/// leaked access secret cannot mint refresh tokens.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct JwtConfig {
    /// Secret for access tokens
    pub access_secret: String,

    /// Secret for refresh tokens
    pub refresh_secret: String,

    /// Access token lifetime, e.g. `"1h"`
    #[serde(default = "default_access_expires_in")]
    pub access_expires_in: String,

    /// Refresh token lifetime, e.g. `"7d"`
    #[serde(default = "default_refresh_expires_in")]
    pub refresh_expires_in: String,

    /// JWT issuer claim
    #[serde(default = "default_issuer")]
    pub issuer: String,
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            access_secret: String::new(),
            refresh_secret: String::new(),
            access_expires_in: default_access_expires_in(),
            refresh_expires_in: default_refresh_expires_in(),
            issuer: default_issuer(),
        }
    }
}

impl JwtConfig {
    /// Create a new JWT configuration with both secrets
    pub fn new(access_secret: impl Into<String>, refresh_secret: impl Into<String>) -> Self {
        Self {
            access_secret: access_secret.into(),
            refresh_secret: refresh_secret.into(),
            ..Default::default()
        }
    }

    pub fn from_lookup(lookup: Lookup<'_>) -> Self {
        let defaults = Self::default();
        Self {
            access_secret: lookup("JWT_ACCESS_SECRET").unwrap_or_default(),
            refresh_secret: lookup("JWT_REFRESH_SECRET").unwrap_or_default(),
            access_expires_in: lookup("JWT_ACCESS_EXPIRES_IN").unwrap_or(defaults.access_expires_in),
            refresh_expires_in: lookup("JWT_REFRESH_EXPIRES_IN")
                .unwrap_or(defaults.refresh_expires_in),
            issuer: lookup("JWT_ISSUER").unwrap_or(defaults.issuer),
        }
    }

    /// Set the access token lifetime string
    pub fn with_access_expires_in(mut self, value: impl Into<String>) -> Self {
        self.access_expires_in = value.into();
        self
    }

    /// Set the refresh token lifetime string
    pub fn with_refresh_expires_in(mut self, value: impl Into<String>) -> Self {
        self.refresh_expires_in = value.into();
        self
    }

    /// Parsed access token lifetime
    pub fn access_ttl(&self) -> Result<Duration, ConfigError> {
        parse_duration(&self.access_expires_in)
    }

    /// Parsed refresh token lifetime
    pub fn refresh_ttl(&self) -> Result<Duration, ConfigError> {
        parse_duration(&self.refresh_expires_in)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.access_secret.is_empty() {
            return Err(ConfigError::Missing("JWT_ACCESS_SECRET"));
        }
        if self.refresh_secret.is_empty() {
            return Err(ConfigError::Missing("JWT_REFRESH_SECRET"));
        }
        if self.access_secret == self.refresh_secret {
            return Err(ConfigError::Validation(
                "access and refresh secrets must differ".to_string(),
            ));
        }

        for ttl in [self.access_ttl()?, self.refresh_ttl()?] {
            if ttl.is_zero() {
                return Err(ConfigError::Validation(
                    "token lifetimes must be positive".to_string(),
                ));
            }
        }

        Ok(())
    }
}

/// Attributes of the credential cookies
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CookieConfig {
    /// Cookie carrying the access token
    pub access_cookie_name: String,

    /// Cookie carrying the refresh token
    pub refresh_cookie_name: String,

    /// HTTPS only
    pub secure: bool,

    #[serde(default = "default_http_only")]
    pub http_only: bool,

    /// SameSite attribute
    pub same_site: String,

    pub path: String,
}

impl Default for CookieConfig {
    fn default() -> Self {
        Self {
            access_cookie_name: String::from("jwt"),
            refresh_cookie_name: String::from("refreshToken"),
            secure: false,
            http_only: default_http_only(),
            same_site: String::from("Lax"),
            path: String::from("/"),
        }
    }
}

impl CookieConfig {
    /// Cookies are marked `Secure` only in production
    pub fn for_environment(env: Environment) -> Self {
        Self {
            secure: env.is_production(),
            ..Default::default()
        }
    }
}

fn default_access_expires_in() -> String {
    String::from("1h")
}

fn default_refresh_expires_in() -> String {
    String::from("7d")
}

fn default_issuer() -> String {
    String::from("phone-auth")
}

fn default_http_only() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_jwt_config_default() {
        let config = JwtConfig::default();
        assert_eq!(config.access_ttl().unwrap(), Duration::from_secs(3600));
        assert_eq!(config.refresh_ttl().unwrap(), Duration::from_secs(604_800));
        assert_eq!(config.issuer, "phone-auth");
        assert_eq!(config.validate(), Err(ConfigError::Missing("JWT_ACCESS_SECRET")));
    }

    #[test]
    fn test_jwt_config_builder() {
        let config = JwtConfig::new("a-secret", "r-secret")
            .with_access_expires_in("15m")
            .with_refresh_expires_in("14d");

        assert_eq!(config.access_ttl().unwrap(), Duration::from_secs(900));
        assert_eq!(config.refresh_ttl().unwrap(), Duration::from_secs(1_209_600));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_jwt_config_rejects_shared_secret() {
        let config = JwtConfig::new("same", "same");
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_jwt_config_rejects_bad_durations() {
        let config = JwtConfig::new("a", "b").with_access_expires_in("soon");
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidDuration { .. })
        ));

        let config = JwtConfig::new("a", "b").with_refresh_expires_in("0d");
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_cookie_config_per_environment() {
        let dev = CookieConfig::for_environment(Environment::Development);
        assert!(!dev.secure);
        assert!(dev.http_only);
        assert_eq!(dev.same_site, "Lax");
        assert_eq!(dev.access_cookie_name, "jwt");
        assert_eq!(dev.refresh_cookie_name, "refreshToken");

        assert!(CookieConfig::for_environment(Environment::Production).secure);
    }
}
