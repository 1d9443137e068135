//! In-memory user store for development and tests

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::entities::user::User;
use crate::errors::DomainError;

use super::trait_::UserRepository;

/// User store backed by a `HashMap` behind an async `RwLock`.
///
/// Cloning shares the underlying map.
#[derive(Clone, Default)]
pub struct InMemoryUserRepository {
    users: Arc<RwLock<HashMap<Uuid, User>>>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored users
    pub async fn len(&self) -> usize {
        self.users.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.users.read().await.is_empty()
    }
}

fn missing(id: Uuid) -> DomainError {
    DomainError::Storage {
        message: format!("user {} does not exist", id),
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn find_by_phone(&self, phone_number: &str) -> Result<Option<User>, DomainError> {
        let users = self.users.read().await;
        Ok(users
            .values()
            .find(|u| u.phone_number == phone_number)
            .cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, DomainError> {
        let users = self.users.read().await;
        Ok(users.get(&id).cloned())
    }

    async fn create(&self, user: User) -> Result<User, DomainError> {
        if user.phone_number.trim().is_empty() {
            return Err(DomainError::Validation {
                message: "phone number must not be empty".to_string(),
            });
        }

        let mut users = self.users.write().await;

        if users.values().any(|u| u.phone_number == user.phone_number) {
            return Err(DomainError::Validation {
                message: format!("phone number {} already registered", user.phone_number),
            });
        }

        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn save(&self, user: &User) -> Result<(), DomainError> {
        let mut users = self.users.write().await;
        let stored = users.get_mut(&user.id).ok_or_else(|| missing(user.id))?;

        let slot = stored.active_refresh_token.take();
        *stored = user.clone();
        stored.active_refresh_token = slot;
        Ok(())
    }

    async fn set_challenge(
        &self,
        id: Uuid,
        code: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), DomainError> {
        let mut users = self.users.write().await;
        let user = users.get_mut(&id).ok_or_else(|| missing(id))?;
        user.otp_code = Some(code.to_string());
        user.otp_expires_at = Some(expires_at);
        user.touch();
        Ok(())
    }

    async fn consume_challenge(&self, id: Uuid, code: &str) -> Result<bool, DomainError> {
        let mut users = self.users.write().await;
        match users.get_mut(&id) {
            Some(user) if user.otp_code.as_deref() == Some(code) => {
                user.clear_challenge();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn mark_verified(&self, id: Uuid) -> Result<(), DomainError> {
        let mut users = self.users.write().await;
        let user = users.get_mut(&id).ok_or_else(|| missing(id))?;
        user.verify();
        Ok(())
    }

    async fn set_refresh_token(&self, id: Uuid, digest: Option<&str>) -> Result<(), DomainError> {
        let mut users = self.users.write().await;
        if let Some(user) = users.get_mut(&id) {
            user.active_refresh_token = digest.map(str::to_string);
            user.touch();
        }
        Ok(())
    }

    async fn swap_refresh_token(
        &self,
        id: Uuid,
        expected: Option<&str>,
        new: Option<&str>,
    ) -> Result<bool, DomainError> {
        let mut users = self.users.write().await;
        let Some(user) = users.get_mut(&id) else {
            return Ok(false);
        };

        if user.active_refresh_token.as_deref() != expected {
            return Ok(false);
        }

        user.active_refresh_token = new.map(str::to_string);
        user.touch();
        Ok(true)
    }
}
