pub mod auth;
pub mod cors;
pub mod rate_limit;
pub mod security;

pub use auth::{AuthContext, OptionalAuth, SessionGuard};
pub use cors::create_cors;
pub use rate_limit::RateLimiter;
pub use security::SecurityMiddleware;
