//! One-time password configuration

use serde::{Deserialize, Serialize};

use super::{parse_or, ConfigError, Environment, Lookup, MAX_OTP_LENGTH};

/// Where OTP challenges are issued and checked
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OtpMode {
    /// Codes are generated and stored on the user record
    Local,
    /// Codes are generated, delivered and checked by an external gateway
    Remote,
}

impl OtpMode {
    /// Development talks to nothing external; every other environment uses the gateway.
    pub fn for_environment(env: Environment) -> Self {
        if env.is_development() {
            OtpMode::Local
        } else {
            OtpMode::Remote
        }
    }
}

impl std::str::FromStr for OtpMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "local" => Ok(OtpMode::Local),
            "remote" | "gateway" => Ok(OtpMode::Remote),
            _ => Err(format!("Invalid OTP mode: {}", s)),
        }
    }
}

/// OTP generation settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OtpConfig {
    /// Number of digits in a code
    pub length: u32,

    /// Minutes a challenge stays valid
    pub ttl_minutes: u32,

    pub mode: OtpMode,
}

impl Default for OtpConfig {
    fn default() -> Self {
        Self {
            length: 6,
            ttl_minutes: 3,
            mode: OtpMode::Local,
        }
    }
}

impl OtpConfig {
    pub fn from_lookup(lookup: Lookup<'_>, env: Environment) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        Ok(Self {
            length: parse_or(lookup, "OTP_LIMIT", defaults.length)?,
            ttl_minutes: parse_or(lookup, "OTP_TTL_MIN", defaults.ttl_minutes)?,
            mode: parse_or(lookup, "OTP_MODE", OtpMode::for_environment(env))?,
        })
    }

    pub fn with_length(mut self, length: u32) -> Self {
        self.length = length;
        self
    }

    pub fn with_ttl_minutes(mut self, minutes: u32) -> Self {
        self.ttl_minutes = minutes;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.length == 0 || self.length > MAX_OTP_LENGTH {
            return Err(ConfigError::Validation(format!(
                "OTP length must be between 1 and {}",
                MAX_OTP_LENGTH
            )));
        }
        if self.ttl_minutes == 0 {
            return Err(ConfigError::Validation(
                "OTP TTL must be at least one minute".to_string(),
            ));
        }
        Ok(())
    }
}

/// External OTP gateway settings (2Factor-style HTTP API)
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OtpGatewayConfig {
    /// Base URL, e.g. `https://2factor.in/API/V1`
    pub base_url: String,

    pub api_key: String,

    /// SMS template name passed to AUTOGEN
    pub template: String,

    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for OtpGatewayConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            api_key: String::new(),
            template: String::from("OTP1"),
            timeout_secs: 10,
        }
    }
}

impl OtpGatewayConfig {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
            ..Default::default()
        }
    }

    pub fn from_lookup(lookup: Lookup<'_>) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        Ok(Self {
            base_url: lookup("OTP_URL").unwrap_or_default(),
            api_key: lookup("OTP_API_KEY").unwrap_or_default(),
            template: lookup("OTP_TEMPLATE").unwrap_or(defaults.template),
            timeout_secs: parse_or(lookup, "OTP_TIMEOUT_SECS", defaults.timeout_secs)?,
        })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.base_url.is_empty() {
            return Err(ConfigError::Missing("OTP_URL"));
        }
        if self.api_key.is_empty() {
            return Err(ConfigError::Missing("OTP_API_KEY"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::lookup_from;
    use super::*;

    #[test]
    fn test_mode_follows_environment_unless_overridden() {
        let empty = lookup_from(&[]);
        let config = OtpConfig::from_lookup(&empty, Environment::Staging).unwrap();
        assert_eq!(config.mode, OtpMode::Remote);

        let forced = lookup_from(&[("OTP_MODE", "local")]);
        let config = OtpConfig::from_lookup(&forced, Environment::Production).unwrap();
        assert_eq!(config.mode, OtpMode::Local);
    }

    #[test]
    fn test_length_bounds() {
        assert!(OtpConfig::default().with_length(1).validate().is_ok());
        assert!(OtpConfig::default().with_length(18).validate().is_ok());
        assert!(OtpConfig::default().with_length(0).validate().is_err());
        assert!(OtpConfig::default().with_length(19).validate().is_err());
        assert!(OtpConfig::default().with_ttl_minutes(0).validate().is_err());
    }

    #[test]
    fn test_gateway_from_lookup() {
        let lookup = lookup_from(&[
            ("OTP_URL", "https://otp.example.com/API/V1"),
            ("OTP_API_KEY", "secret-key"),
            ("OTP_TIMEOUT_SECS", "5"),
        ]);
        let config = OtpGatewayConfig::from_lookup(&lookup).unwrap();

        assert_eq!(config.base_url, "https://otp.example.com/API/V1");
        assert_eq!(config.template, "OTP1");
        assert_eq!(config.timeout_secs, 5);
        assert!(config.validate().is_ok());
        assert_eq!(
            OtpGatewayConfig::default().validate(),
            Err(ConfigError::Missing("OTP_URL"))
        );
    }
}
