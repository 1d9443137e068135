//! Authentication route handlers
//!
//! - `send-otp` / `verify-otp`: the OTP login flow
//! - `refresh-token`: explicit rotation from the refresh cookie
//! - `logout`: clears the session
//! - `me`: the current principal, behind the session guard

pub mod logout;
pub mod me;
pub mod refresh;
pub mod send_otp;
pub mod verify_otp;

pub use logout::logout;
pub use me::me;
pub use refresh::refresh_token;
pub use send_otp::send_otp;
pub use verify_otp::verify_otp;
