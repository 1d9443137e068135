//! Domain entities representing core business objects.

pub mod token;
pub mod user;

// Re-export commonly used types
pub use token::{Claims, TokenKind, TokenPair, TokenSubject};
pub use user::{Principal, User, DEFAULT_ROLE};
