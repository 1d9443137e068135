//! Shared utilities and configuration for the PhoneAuth server
//!
//! This crate provides functionality used across all server crates:
//! - Configuration types read from the environment
//! - Duration string parsing (`"15m"`, `"1h"`, `"7d"`)
//! - Phone number helpers (normalization, masking, boundary validation)

pub mod config;
pub mod utils;

// Re-export commonly used items at crate root
pub use config::{
    AppConfig, ConfigError, CookieConfig, CorsConfig, DatabaseConfig, Environment, JwtConfig, OtpConfig,
    OtpGatewayConfig, OtpMode, RateLimitConfig, ServerConfig, StoreKind,
};
pub use utils::{duration, phone};
