//! Rate limiting configuration module

use std::net::IpAddr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::{parse_or, ConfigError, Lookup};

/// Per-client-IP limit applied to the auth endpoints
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RateLimitConfig {
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Requests allowed per window
    pub max_requests: u32,

    /// Window length in minutes
    pub window_minutes: u64,

    /// Peers whose `X-Forwarded-For` / `Forwarded` headers are believed
    #[serde(default)]
    pub trusted_proxies: Vec<IpAddr>,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            max_requests: 100,
            window_minutes: 15,
            trusted_proxies: Vec::new(),
        }
    }
}

impl RateLimitConfig {
    pub fn from_lookup(lookup: Lookup<'_>) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        Ok(Self {
            enabled: parse_or(lookup, "AUTH_LIMIT_ENABLED", defaults.enabled)?,
            max_requests: parse_or(lookup, "AUTH_LIMIT", defaults.max_requests)?,
            window_minutes: parse_or(lookup, "AUTH_LIMIT_TIME", defaults.window_minutes)?,
            trusted_proxies: parse_proxies(lookup)?,
        })
    }

    pub fn new(max_requests: u32, window_minutes: u64) -> Self {
        Self {
            max_requests,
            window_minutes,
            ..Self::default()
        }
    }

    pub fn with_trusted_proxies(mut self, proxies: Vec<IpAddr>) -> Self {
        self.trusted_proxies = proxies;
        self
    }

    /// Window length in seconds
    pub fn window_secs(&self) -> u64 {
        self.window_minutes * 60
    }

    /// Time for one spent request to be credited back.
    ///
    /// A full burst of `max_requests` is refilled over one window.
    pub fn replenish_interval(&self) -> Duration {
        Duration::from_secs(self.window_secs()) / self.max_requests.max(1)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.enabled {
            return Ok(());
        }
        if self.max_requests == 0 || self.window_minutes == 0 {
            return Err(ConfigError::Validation(
                "AUTH_LIMIT and AUTH_LIMIT_TIME must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

fn parse_proxies(lookup: Lookup<'_>) -> Result<Vec<IpAddr>, ConfigError> {
    let Some(raw) = lookup("TRUSTED_PROXIES") else {
        return Ok(Vec::new());
    };

    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse().map_err(|_| ConfigError::Invalid {
                key: "TRUSTED_PROXIES",
                value: s.to_string(),
            })
        })
        .collect()
}

fn default_enabled() -> bool {
    true
}
