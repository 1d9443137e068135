//! # PhoneAuth Core
//!
//! Domain layer for phone-number authentication: OTP challenges, paired
//! access/refresh JWTs, silent rotation and reuse detection.
//! This crate holds the domain entities, services, repository interfaces
//! and error types; adapters for storage, delivery and HTTP live elsewhere.

pub mod domain;
pub mod errors;
pub mod repositories;
pub mod services;

// Re-export commonly used types for convenience
pub use domain::entities::{Claims, Principal, TokenPair, TokenSubject, User};
pub use domain::value_objects::{Authentication, LoginOutcome, OtpDispatch};
pub use errors::{AuthError, DomainError, DomainResult, TokenError};
pub use repositories::{InMemoryUserRepository, UserRepository};
pub use services::{
    authorize, refresh_token_digest, AuthService, LocalBackend, OtpBackend, OtpEngine, OtpGateway, RemoteGatewayBackend,
    SessionAuthenticator, TokenConfig, TokenService,
};
