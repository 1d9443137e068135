//! Value objects returned by the authentication flows.

pub mod auth_outcome;

pub use auth_outcome::{Authentication, LoginOutcome, OtpDispatch};
