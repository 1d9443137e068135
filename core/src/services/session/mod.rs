//! Per-request session authentication with silent refresh-token rotation

mod authenticator;

pub use authenticator::{authorize, SessionAuthenticator};
