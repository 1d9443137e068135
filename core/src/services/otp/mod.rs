//! One-time password challenges
//!
//! - `generator` - CSPRNG decimal codes
//! - `engine` - challenges stored on the user record
//! - `backend` - local engine or remote gateway behind one interface
//! - `traits` - the external delivery gateway contract

mod backend;
mod engine;
mod generator;
mod traits;

pub use backend::{LocalBackend, OtpBackend, RemoteGatewayBackend};
pub use engine::OtpEngine;
pub use generator::generate_code;
pub use traits::OtpGateway;
