//! # Infrastructure Layer
//!
//! Concrete adapters for the PhoneAuth core:
//! - **Database**: MySQL user store using SQLx
//! - **OTP**: HTTP client for the SMS OTP gateway, plus a scripted mock

use pa_core::errors::DomainError;

/// Database module - MySQL implementations using SQLx
pub mod database;

/// OTP gateway clients
pub mod otp;

pub use database::{DatabasePool, MySqlUserRepository};
pub use otp::{HttpOtpGateway, MockOtpGateway};

/// Infrastructure-specific error types
#[derive(Debug, thiserror::Error)]
pub enum InfrastructureError {
    /// Database connection error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// HTTP request error for external services
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// The OTP gateway answered but refused the request
    #[error("OTP gateway error: {0}")]
    Gateway(String),
}

impl From<InfrastructureError> for DomainError {
    fn from(err: InfrastructureError) -> Self {
        DomainError::Storage {
            message: err.to_string(),
        }
    }
}
