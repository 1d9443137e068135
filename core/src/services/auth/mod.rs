//! Authentication service module
//!
//! Top-level flows that sequence the OTP backend, the token service and the
//! session authenticator:
//! - Requesting an OTP for a registered phone number
//! - Logging in with an OTP
//! - Explicit refresh-token rotation
//! - Logout

mod service;

#[cfg(test)]
mod tests;

pub use service::AuthService;
