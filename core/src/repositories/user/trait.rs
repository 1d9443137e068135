//! User repository trait defining the interface for user record persistence.
//!
//! The refresh slot (`active_refresh_token`) is never written by
//! [`UserRepository::save`]; it changes only through the slot operations.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::entities::user::User;
use crate::errors::DomainError;

/// Repository trait for User persistence operations
///
/// # Example Implementation
/// ```no_run
/// use async_trait::async_trait;
/// use uuid::Uuid;
/// use pa_core::repositories::UserRepository;
/// use pa_core::domain::entities::user::User;
/// use pa_core::errors::DomainError;
///
/// struct PostgresUserRepository {
///     // connection pool
/// }
///
/// #[async_trait]
/// impl UserRepository for PostgresUserRepository {
///     async fn find_by_phone(&self, phone_number: &str) -> Result<Option<User>, DomainError> {
///         Ok(None)
///     }
///
///     // ... other methods
/// #   async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, DomainError> { Ok(None) }
/// #   async fn create(&self, user: User) -> Result<User, DomainError> { Ok(user) }
/// #   async fn save(&self, user: &User) -> Result<(), DomainError> { Ok(()) }
/// #   async fn set_challenge(&self, id: Uuid, code: &str, expires_at: chrono::DateTime<chrono::Utc>) -> Result<(), DomainError> { Ok(()) }
/// #   async fn consume_challenge(&self, id: Uuid, code: &str) -> Result<bool, DomainError> { Ok(true) }
/// #   async fn mark_verified(&self, id: Uuid) -> Result<(), DomainError> { Ok(()) }
/// #   async fn set_refresh_token(&self, id: Uuid, digest: Option<&str>) -> Result<(), DomainError> { Ok(()) }
/// #   async fn swap_refresh_token(&self, id: Uuid, expected: Option<&str>, new: Option<&str>) -> Result<bool, DomainError> { Ok(true) }
/// }
/// ```
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Find a user by phone number
    ///
    /// # Returns
    /// * `Ok(Some(User))` - User found
    /// * `Ok(None)` - No user registered with this number
    /// * `Err(DomainError)` - Storage failure
    async fn find_by_phone(&self, phone_number: &str) -> Result<Option<User>, DomainError>;

    /// Find a user by their unique identifier
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, DomainError>;

    /// Insert a new user; fails with `Validation` when the phone number is taken
    async fn create(&self, user: User) -> Result<User, DomainError>;

    /// Persist every field of `user` except the refresh slot
    async fn save(&self, user: &User) -> Result<(), DomainError>;

    /// Replace the user's OTP challenge, leaving every other field alone
    async fn set_challenge(
        &self,
        id: Uuid,
        code: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), DomainError>;

    /// Clear the OTP fields only if `code` is still the active challenge.
    ///
    /// Returns whether this call consumed it, which makes a successful OTP
    /// verification single-use even under concurrent submissions. A challenge
    /// replaced in the meantime is left in place.
    async fn consume_challenge(&self, id: Uuid, code: &str) -> Result<bool, DomainError>;

    /// Set `is_verified` without touching the challenge or the refresh slot
    async fn mark_verified(&self, id: Uuid) -> Result<(), DomainError>;

    /// Unconditionally overwrite the refresh slot
    async fn set_refresh_token(&self, id: Uuid, digest: Option<&str>) -> Result<(), DomainError>;

    /// Compare-and-swap the refresh slot.
    ///
    /// Writes `new` only if the slot currently equals `expected` (both `None`
    /// counts as equal). Returns whether the write happened; a missing user
    /// yields `Ok(false)`.
    async fn swap_refresh_token(
        &self,
        id: Uuid,
        expected: Option<&str>,
        new: Option<&str>,
    ) -> Result<bool, DomainError>;

    /// Empty the refresh slot
    async fn clear_refresh_token(&self, id: Uuid) -> Result<(), DomainError> {
        self.set_refresh_token(id, None).await
    }
}
