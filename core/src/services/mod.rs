//! Business services containing domain logic and use cases.

pub mod auth;
pub mod otp;
pub mod session;
pub mod token;

// Re-export commonly used types
pub use auth::AuthService;
pub use otp::{generate_code, LocalBackend, OtpBackend, OtpEngine, OtpGateway, RemoteGatewayBackend};
pub use session::{authorize, SessionAuthenticator};
pub use token::{refresh_token_digest, TokenConfig, TokenService};
