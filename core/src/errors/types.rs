//! Error types for authentication and token handling
//!
//! Display strings here are internal. The presentation layer decides what a
//! client gets to see, e.g. `UserNotFound` and `ChallengeMismatch` share one
//! outward message.

use thiserror::Error;

/// Authentication-related errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// No credentials were presented at all
    #[error("Not authenticated")]
    Unauthenticated,

    /// The access token was present but not acceptable
    #[error("Unauthorized")]
    Unauthorized,

    /// The refresh token failed verification; the session is over
    #[error("Session expired")]
    SessionExpired,

    /// The refresh token verified but is no longer the active one
    #[error("Refresh token revoked")]
    RevokedToken,

    #[error("OTP challenge expired")]
    ChallengeExpired,

    #[error("OTP does not match")]
    ChallengeMismatch,

    #[error("No active OTP challenge")]
    NoActiveChallenge,

    #[error("User not found")]
    UserNotFound,

    #[error("Insufficient permissions")]
    InsufficientPermissions,

    #[error("OTP delivery failed: {reason}")]
    DeliveryFailed { reason: String },
}

impl AuthError {
    /// Failures after which the client must drop both tokens
    pub fn clears_credentials(&self) -> bool {
        matches!(self, AuthError::SessionExpired | AuthError::RevokedToken)
    }
}

/// Token-related errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("Token expired")]
    TokenExpired,

    #[error("Invalid token")]
    TokenInvalid,

    #[error("Token signing failed: {message}")]
    SigningError { message: String },
}
