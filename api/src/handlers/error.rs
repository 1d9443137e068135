//! Mapping from domain errors to HTTP responses
//!
//! | error | status |
//! |---|---|
//! | Unauthenticated, Unauthorized, token errors, UserNotFound (session) | 401 |
//! | SessionExpired, RevokedToken, InsufficientPermissions | 403 |
//! | ChallengeExpired, NoActiveChallenge, ChallengeMismatch, UserNotFound (login) | 400 |
//! | DeliveryFailed | 502 |
//! | Validation | 400 |
//! | Storage, Internal, SigningError | 500 |
//!
//! `SessionExpired` and `RevokedToken` also clear both credential cookies.

use std::fmt;

use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use validator::ValidationErrors;

use pa_core::{AuthError, DomainError, TokenError};
use pa_shared::config::CookieConfig;

use crate::cookies::clear_session_cookies;
use crate::dto::ErrorResponse;

/// Where the error surfaced; decides how `UserNotFound` is rendered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorContext {
    /// OTP request or login; unknown phones look like bad codes
    Login,
    /// Authenticating an existing session
    Session,
}

/// Domain error ready to be rendered as an HTTP response
#[derive(Debug)]
pub struct ApiError {
    error: DomainError,
    context: ErrorContext,
    cookies: Option<CookieConfig>,
    details: Option<serde_json::Value>,
}

impl ApiError {
    pub fn login(error: impl Into<DomainError>) -> Self {
        Self {
            error: error.into(),
            context: ErrorContext::Login,
            cookies: None,
            details: None,
        }
    }

    /// Session errors carry the cookie settings so revocation can clear them
    pub fn session(error: impl Into<DomainError>, cookies: &CookieConfig) -> Self {
        Self {
            error: error.into(),
            context: ErrorContext::Session,
            cookies: Some(cookies.clone()),
            details: None,
        }
    }

    /// Request body failed validation
    pub fn validation(errors: &ValidationErrors) -> Self {
        let fields: serde_json::Map<String, serde_json::Value> = errors
            .field_errors()
            .into_iter()
            .map(|(field, errs)| {
                let messages: Vec<String> = errs
                    .iter()
                    .map(|e| {
                        e.message
                            .as_ref()
                            .map(|m| m.to_string())
                            .unwrap_or_else(|| e.code.to_string())
                    })
                    .collect();
                (field.to_string(), serde_json::json!(messages))
            })
            .collect();

        let message = fields
            .values()
            .filter_map(|v| v.get(0).and_then(|m| m.as_str()))
            .next()
            .unwrap_or("Invalid request data")
            .to_string();

        Self {
            error: DomainError::Validation { message },
            context: ErrorContext::Login,
            cookies: None,
            details: Some(serde_json::Value::Object(fields)),
        }
    }

    fn code_and_message(&self) -> (&'static str, String) {
        match &self.error {
            DomainError::Auth(auth) => match auth {
                AuthError::Unauthenticated => {
                    ("unauthenticated", "Not authorized, no tokens provided.".into())
                }
                AuthError::Unauthorized => {
                    ("unauthorized", "Not authorized, invalid access token.".into())
                }
                AuthError::SessionExpired => {
                    ("session_expired", "Session expired. Please log in again.".into())
                }
                AuthError::RevokedToken => (
                    "revoked_token",
                    "Invalid or revoked refresh token. Please log in again.".into(),
                ),
                AuthError::ChallengeExpired | AuthError::NoActiveChallenge => (
                    "otp_expired",
                    "OTP expired or not sent. Please request a new one.".into(),
                ),
                AuthError::ChallengeMismatch => ("invalid_credentials", "Invalid credentials".into()),
                AuthError::UserNotFound => match self.context {
                    ErrorContext::Login => ("invalid_credentials", "Invalid credentials".into()),
                    ErrorContext::Session => {
                        ("unauthorized", "Not authorized, user not found.".into())
                    }
                },
                AuthError::InsufficientPermissions => {
                    ("forbidden", "Insufficient permissions.".into())
                }
                AuthError::DeliveryFailed { .. } => (
                    "otp_delivery_failed",
                    "Could not send the OTP. Please try again later.".into(),
                ),
            },
            DomainError::Token(TokenError::TokenExpired) => {
                ("unauthorized", "Not authorized, token expired.".into())
            }
            DomainError::Token(TokenError::TokenInvalid) => {
                ("unauthorized", "Not authorized, token failed.".into())
            }
            DomainError::Validation { message } => ("validation_error", message.clone()),
            DomainError::Token(TokenError::SigningError { .. })
            | DomainError::Storage { .. }
            | DomainError::Internal { .. } => ("internal_error", "An internal error occurred".into()),
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.error, f)
    }
}

impl From<DomainError> for ApiError {
    fn from(error: DomainError) -> Self {
        Self::login(error)
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match &self.error {
            DomainError::Auth(auth) => match auth {
                AuthError::Unauthenticated | AuthError::Unauthorized => StatusCode::UNAUTHORIZED,
                AuthError::SessionExpired
                | AuthError::RevokedToken
                | AuthError::InsufficientPermissions => StatusCode::FORBIDDEN,
                AuthError::ChallengeExpired
                | AuthError::NoActiveChallenge
                | AuthError::ChallengeMismatch => StatusCode::BAD_REQUEST,
                AuthError::UserNotFound => match self.context {
                    ErrorContext::Login => StatusCode::BAD_REQUEST,
                    ErrorContext::Session => StatusCode::UNAUTHORIZED,
                },
                AuthError::DeliveryFailed { .. } => StatusCode::BAD_GATEWAY,
            },
            DomainError::Token(TokenError::TokenExpired | TokenError::TokenInvalid) => {
                StatusCode::UNAUTHORIZED
            }
            DomainError::Validation { .. } => StatusCode::BAD_REQUEST,
            DomainError::Token(TokenError::SigningError { .. })
            | DomainError::Storage { .. }
            | DomainError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self.error, "Request failed");
        } else {
            tracing::info!(error = %self.error, status = status.as_u16(), "Request rejected");
        }

        let (code, message) = self.code_and_message();
        let mut body = ErrorResponse::new(code, message);
        if let Some(details) = &self.details {
            body = body.with_details(details.clone());
        }

        let mut builder = HttpResponse::build(status);
        if let Some(cookies) = &self.cookies {
            if self.error.clears_credentials() {
                clear_session_cookies(&mut builder, cookies);
            }
        }
        builder.json(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status(error: impl Into<DomainError>, context: ErrorContext) -> StatusCode {
        match context {
            ErrorContext::Login => ApiError::login(error).status_code(),
            ErrorContext::Session => ApiError::session(error, &CookieConfig::default()).status_code(),
        }
    }

    #[test]
    fn test_status_table() {
        use ErrorContext::*;

        assert_eq!(status(AuthError::Unauthenticated, Session), StatusCode::UNAUTHORIZED);
        assert_eq!(status(AuthError::Unauthorized, Session), StatusCode::UNAUTHORIZED);
        assert_eq!(status(AuthError::UserNotFound, Session), StatusCode::UNAUTHORIZED);
        assert_eq!(status(AuthError::SessionExpired, Session), StatusCode::FORBIDDEN);
        assert_eq!(status(AuthError::RevokedToken, Session), StatusCode::FORBIDDEN);
        assert_eq!(status(AuthError::InsufficientPermissions, Session), StatusCode::FORBIDDEN);
        assert_eq!(status(AuthError::ChallengeExpired, Login), StatusCode::BAD_REQUEST);
        assert_eq!(status(AuthError::NoActiveChallenge, Login), StatusCode::BAD_REQUEST);
        assert_eq!(status(AuthError::ChallengeMismatch, Login), StatusCode::BAD_REQUEST);
        assert_eq!(status(AuthError::UserNotFound, Login), StatusCode::BAD_REQUEST);
        assert_eq!(
            status(AuthError::DeliveryFailed { reason: "timeout".into() }, Login),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            status(DomainError::storage("down"), Login),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            status(TokenError::SigningError { message: "bad key".into() }, Login),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_unknown_user_and_mismatch_look_alike() {
        let unknown = ApiError::login(AuthError::UserNotFound);
        let mismatch = ApiError::login(AuthError::ChallengeMismatch);
        assert_eq!(unknown.code_and_message(), mismatch.code_and_message());
    }

    #[test]
    fn test_revocation_clears_cookies() {
        let response = ApiError::session(AuthError::RevokedToken, &CookieConfig::default()).error_response();
        let names: Vec<String> = response.cookies().map(|c| c.name().to_string()).collect();
        assert!(names.contains(&"jwt".to_string()));
        assert!(names.contains(&"refreshToken".to_string()));

        let response = ApiError::session(AuthError::Unauthorized, &CookieConfig::default()).error_response();
        assert_eq!(response.cookies().count(), 0);
    }

    #[test]
    fn test_storage_message_is_generic() {
        let error = ApiError::login(DomainError::storage("password=hunter2"));
        let (_, message) = error.code_and_message();
        assert_eq!(message, "An internal error occurred");
    }
}
