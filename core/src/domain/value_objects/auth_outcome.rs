//! Results of the authentication flows

use chrono::{DateTime, Utc};

use crate::domain::entities::{Principal, TokenPair};

/// Result of authenticating a request
#[derive(Debug, Clone)]
pub struct Authentication {
    pub principal: Principal,

    /// Access token the identity was established from
    pub access_token: String,

    /// Set when the session was silently rotated; the transport must emit it
    pub rotated: Option<TokenPair>,
}

impl Authentication {
    pub fn was_rotated(&self) -> bool {
        self.rotated.is_some()
    }
}

/// Result of a successful OTP login
#[derive(Debug, Clone)]
pub struct LoginOutcome {
    pub principal: Principal,
    pub tokens: TokenPair,
}

/// Result of requesting an OTP
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OtpDispatch {
    /// Gateway session id, or a local reference
    pub delivery_id: String,

    /// Known only for locally issued challenges
    pub expires_at: Option<DateTime<Utc>>,

    /// The issued code, only for the local backend
    pub code: Option<String>,
}
