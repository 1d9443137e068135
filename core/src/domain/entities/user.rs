//! User identity record and the principal derived from it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Role assigned to newly created users
pub const DEFAULT_ROLE: &str = "user";

/// User identity record as held by the user store.
///
/// `otp_code`, `otp_expires_at` and `active_refresh_token` are secrets and
/// never leave the service; handlers only ever see a [`Principal`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Unique identifier for the user
    pub id: Uuid,

    /// Display name
    pub name: String,

    /// Unique phone number, as registered
    pub phone_number: String,

    /// Role used for authorization, `"user"` by default
    pub user_role: String,

    /// Set on the first successful OTP login
    pub is_verified: bool,

    /// Currently active OTP challenge
    pub otp_code: Option<String>,

    /// When the active challenge stops being accepted
    pub otp_expires_at: Option<DateTime<Utc>>,

    /// SHA-256 hex digest of the one live refresh token
    pub active_refresh_token: Option<String>,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Creates a new User instance with the default role
    pub fn new(name: impl Into<String>, phone_number: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            phone_number: phone_number.into(),
            user_role: DEFAULT_ROLE.to_string(),
            is_verified: false,
            otp_code: None,
            otp_expires_at: None,
            active_refresh_token: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Sets the role
    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.user_role = role.into();
        self
    }

    /// Marks the user as verified
    pub fn verify(&mut self) {
        self.is_verified = true;
        self.touch();
    }

    /// Drops any pending OTP challenge
    pub fn clear_challenge(&mut self) {
        self.otp_code = None;
        self.otp_expires_at = None;
        self.touch();
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    /// Copy of the identity without the secret fields
    pub fn to_principal(&self) -> Principal {
        Principal {
            id: self.id,
            name: self.name.clone(),
            phone_number: self.phone_number.clone(),
            user_role: self.user_role.clone(),
            is_verified: self.is_verified,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// Authenticated identity attached to a request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Principal {
    pub id: Uuid,
    pub name: String,
    pub phone_number: String,
    pub user_role: String,
    pub is_verified: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Principal {
    /// Whether the principal's role is one of `roles`
    pub fn has_any_role(&self, roles: &[&str]) -> bool {
        roles.iter().any(|role| *role == self.user_role)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_user_defaults() {
        let user = User::new("Asha", "+919999999999");
        assert_eq!(user.user_role, DEFAULT_ROLE);
        assert!(!user.is_verified);
        assert!(user.otp_code.is_none());
        assert!(user.otp_expires_at.is_none());
        assert!(user.active_refresh_token.is_none());
    }

    #[test]
    fn test_clear_challenge() {
        let mut user = User::new("Asha", "+919999999999");
        user.otp_code = Some("123456".to_string());
        user.otp_expires_at = Some(Utc::now());

        user.clear_challenge();

        assert!(user.otp_code.is_none());
        assert!(user.otp_expires_at.is_none());
    }

    #[test]
    fn test_principal_omits_secrets() {
        let mut user = User::new("Asha", "+919999999999").with_role("admin");
        user.otp_code = Some("123456".to_string());
        user.active_refresh_token = Some("digest".to_string());

        let principal = user.to_principal();
        let json = serde_json::to_value(&principal).unwrap();

        assert_eq!(json["phoneNumber"], "+919999999999");
        assert_eq!(json["userRole"], "admin");
        assert_eq!(json["isVerified"], false);
        assert!(json.get("otpCode").is_none());
        assert!(json.get("activeRefreshToken").is_none());
        assert!(principal.has_any_role(&["admin", "owner"]));
        assert!(!principal.has_any_role(&["owner"]));
    }
}
