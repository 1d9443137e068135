//! Domain-specific error types and error handling.

mod types;

pub use types::{AuthError, TokenError};

use thiserror::Error;

/// Core domain errors
#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Storage error: {message}")]
    Storage { message: String },

    #[error("Internal error: {message}")]
    Internal { message: String },

    // Bridge to specific error types
    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Token(#[from] TokenError),
}

impl DomainError {
    /// Shorthand used by store adapters
    pub fn storage(message: impl Into<String>) -> Self {
        DomainError::Storage {
            message: message.into(),
        }
    }

    /// The authentication failure carried by this error, if any
    pub fn as_auth(&self) -> Option<&AuthError> {
        match self {
            DomainError::Auth(err) => Some(err),
            _ => None,
        }
    }

    /// Whether the transport must discard both credentials
    pub fn clears_credentials(&self) -> bool {
        self.as_auth().map_or(false, AuthError::clears_credentials)
    }
}

pub type DomainResult<T> = Result<T, DomainError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_errors_convert_into_domain_error() {
        let err: DomainError = AuthError::RevokedToken.into();
        assert!(matches!(err, DomainError::Auth(AuthError::RevokedToken)));
        assert!(err.clears_credentials());

        let err: DomainError = AuthError::ChallengeMismatch.into();
        assert!(!err.clears_credentials());
    }

    #[test]
    fn test_token_errors_convert_into_domain_error() {
        let err: DomainError = TokenError::TokenExpired.into();
        assert!(matches!(err, DomainError::Token(TokenError::TokenExpired)));
        assert!(err.as_auth().is_none());
        assert_eq!(err.to_string(), "Token expired");
    }

    #[test]
    fn test_storage_helper() {
        let err = DomainError::storage("connection reset");
        assert_eq!(err.to_string(), "Storage error: connection reset");
    }
}
