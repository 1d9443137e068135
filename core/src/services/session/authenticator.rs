//! Session authenticator
//!
//! Decision procedure for one request, given the optional access and refresh
//! tokens the transport found:
//!
//! 1. neither present: `Unauthenticated`
//! 2. access token valid: identity established
//! 3. access token invalid (not merely expired): `Unauthorized`, no fallback
//! 4. access token expired or absent, refresh token present: rotate
//! 5. access token expired, no refresh token: `Unauthorized`
//!
//! Rotation is single-use. The refresh slot holds the digest of the one live
//! refresh token and is moved to the new digest with a compare-and-swap, so
//! of two concurrent rotations with the same token only one succeeds.

use std::sync::Arc;

use pa_shared::phone::mask_phone_number;

use crate::domain::entities::token::{TokenPair, TokenSubject};
use crate::domain::entities::user::{Principal, User};
use crate::domain::value_objects::Authentication;
use crate::errors::{AuthError, DomainResult, TokenError};
use crate::repositories::UserRepository;
use crate::services::token::{refresh_token_digest, TokenService};

/// Reject with `InsufficientPermissions` unless the principal holds one of `roles`
pub fn authorize(principal: &Principal, roles: &[&str]) -> Result<(), AuthError> {
    if principal.has_any_role(roles) {
        Ok(())
    } else {
        tracing::warn!(
            user_id = %principal.id,
            role = %principal.user_role,
            event = "authorization_denied",
            "Role not permitted"
        );
        Err(AuthError::InsufficientPermissions)
    }
}

/// Validates credentials on each request and rotates expired sessions
pub struct SessionAuthenticator {
    tokens: Arc<TokenService>,
    repository: Arc<dyn UserRepository>,
}

impl SessionAuthenticator {
    pub fn new(tokens: Arc<TokenService>, repository: Arc<dyn UserRepository>) -> Self {
        Self { tokens, repository }
    }

    /// Establish the identity behind a request.
    ///
    /// When the result carries `rotated`, the transport must replace both
    /// client credentials with it. On `SessionExpired` or `RevokedToken` the
    /// transport must clear both.
    pub async fn authenticate(
        &self,
        access_token: Option<&str>,
        refresh_token: Option<&str>,
    ) -> DomainResult<Authentication> {
        let access_token = access_token.filter(|t| !t.is_empty());
        let refresh_token = refresh_token.filter(|t| !t.is_empty());

        match (access_token, refresh_token) {
            (None, None) => Err(AuthError::Unauthenticated.into()),
            (Some(access), refresh) => match self.tokens.verify_access_token(access) {
                Ok(claims) => {
                    let principal = self.load_principal(&claims.subject()).await?;
                    Ok(Authentication {
                        principal,
                        access_token: access.to_string(),
                        rotated: None,
                    })
                }
                Err(TokenError::TokenExpired) => match refresh {
                    Some(refresh) => self.rotate(refresh).await,
                    None => Err(AuthError::Unauthorized.into()),
                },
                Err(_) => {
                    tracing::warn!(event = "access_token_invalid", "Rejected invalid access token");
                    Err(AuthError::Unauthorized.into())
                }
            },
            (None, Some(refresh)) => self.rotate(refresh).await,
        }
    }

    /// Exchange a refresh token for a new pair.
    ///
    /// The presented token must verify and must be the one whose digest is
    /// in the user's refresh slot. A verified but stale token is treated as
    /// reuse: the slot is emptied and `RevokedToken` returned.
    pub async fn rotate(&self, refresh_token: &str) -> DomainResult<Authentication> {
        let claims = self.tokens.verify_refresh_token(refresh_token).map_err(|e| {
            tracing::info!(error = %e, event = "refresh_token_rejected", "Refresh token failed verification");
            AuthError::SessionExpired
        })?;

        let Some(user) = self.repository.find_by_id(claims.user_id).await? else {
            tracing::warn!(
                user_id = %claims.user_id,
                event = "refresh_reuse_detected",
                "Refresh token for unknown user"
            );
            return Err(AuthError::RevokedToken.into());
        };

        let presented = refresh_token_digest(refresh_token);
        if user.active_refresh_token.as_deref() != Some(presented.as_str()) {
            self.revoke_observed(&user).await?;
            return Err(AuthError::RevokedToken.into());
        }

        let pair = self.tokens.issue_pair(&TokenSubject::from(&user))?;
        let next = refresh_token_digest(&pair.refresh_token);

        let swapped = self
            .repository
            .swap_refresh_token(user.id, Some(&presented), Some(&next))
            .await?;
        if !swapped {
            tracing::warn!(
                user_id = %user.id,
                event = "refresh_rotation_conflict",
                "Refresh token already rotated by a concurrent request"
            );
            return Err(AuthError::RevokedToken.into());
        }

        tracing::info!(
            user_id = %user.id,
            phone = %mask_phone_number(&user.phone_number),
            event = "token_rotated",
            "Session rotated"
        );

        Ok(Self::rotated(&user, pair))
    }

    fn rotated(user: &User, pair: TokenPair) -> Authentication {
        Authentication {
            principal: user.to_principal(),
            access_token: pair.access_token.clone(),
            rotated: Some(pair),
        }
    }

    /// Empty the slot if it still holds what we observed
    async fn revoke_observed(&self, user: &User) -> DomainResult<()> {
        let observed = user.active_refresh_token.as_deref();
        if observed.is_some() {
            self.repository
                .swap_refresh_token(user.id, observed, None)
                .await?;
        }
        tracing::warn!(
            user_id = %user.id,
            phone = %mask_phone_number(&user.phone_number),
            event = "refresh_reuse_detected",
            "Stale refresh token presented, session revoked"
        );
        Ok(())
    }

    async fn load_principal(&self, subject: &TokenSubject) -> DomainResult<Principal> {
        self.repository
            .find_by_id(subject.user_id)
            .await?
            .map(|user| user.to_principal())
            .ok_or_else(|| AuthError::UserNotFound.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    use crate::errors::DomainError;
    use crate::repositories::InMemoryUserRepository;
    use crate::services::token::TokenConfig;

    struct Fixture {
        tokens: Arc<TokenService>,
        repo: InMemoryUserRepository,
        authenticator: SessionAuthenticator,
        user: User,
    }

    async fn fixture() -> Fixture {
        let tokens = Arc::new(TokenService::new(TokenConfig::new("access", "refresh")).unwrap());
        let repo = InMemoryUserRepository::new();
        let user = repo.create(User::new("Asha", "+919999999999")).await.unwrap();
        let authenticator = SessionAuthenticator::new(tokens.clone(), Arc::new(repo.clone()));
        Fixture {
            tokens,
            repo,
            authenticator,
            user,
        }
    }

    impl Fixture {
        /// Issue a pair as login would and store its refresh digest
        async fn login_pair(&self, issued_at: chrono::DateTime<Utc>) -> TokenPair {
            let pair = self
                .tokens
                .issue_pair_at(&TokenSubject::from(&self.user), issued_at)
                .unwrap();
            self.repo
                .set_refresh_token(self.user.id, Some(&refresh_token_digest(&pair.refresh_token)))
                .await
                .unwrap();
            pair
        }

        async fn slot(&self) -> Option<String> {
            self.repo
                .find_by_id(self.user.id)
                .await
                .unwrap()
                .unwrap()
                .active_refresh_token
        }
    }

    fn auth_err(result: DomainResult<Authentication>) -> AuthError {
        match result {
            Err(DomainError::Auth(err)) => err,
            other => panic!("expected auth error, got {:?}", other.map(|a| a.principal)),
        }
    }

    #[tokio::test]
    async fn test_no_credentials() {
        let f = fixture().await;
        assert_eq!(
            auth_err(f.authenticator.authenticate(None, None).await),
            AuthError::Unauthenticated
        );
        assert_eq!(
            auth_err(f.authenticator.authenticate(Some(""), Some("")).await),
            AuthError::Unauthenticated
        );
    }

    #[tokio::test]
    async fn test_valid_access_token() {
        let f = fixture().await;
        let pair = f.login_pair(Utc::now()).await;

        let auth = f
            .authenticator
            .authenticate(Some(&pair.access_token), Some(&pair.refresh_token))
            .await
            .unwrap();

        assert_eq!(auth.principal.id, f.user.id);
        assert!(!auth.was_rotated());
        assert_eq!(auth.access_token, pair.access_token);
    }

    #[tokio::test]
    async fn test_invalid_access_token_does_not_fall_back() {
        let f = fixture().await;
        let pair = f.login_pair(Utc::now()).await;

        let result = f
            .authenticator
            .authenticate(Some("garbage"), Some(&pair.refresh_token))
            .await;

        assert_eq!(auth_err(result), AuthError::Unauthorized);
        assert!(f.slot().await.is_some());
    }

    #[tokio::test]
    async fn test_expired_access_without_refresh() {
        let f = fixture().await;
        let pair = f.login_pair(Utc::now() - Duration::hours(2)).await;

        let result = f.authenticator.authenticate(Some(&pair.access_token), None).await;
        assert_eq!(auth_err(result), AuthError::Unauthorized);
    }

    #[tokio::test]
    async fn test_expired_access_rotates_silently() {
        let f = fixture().await;
        let pair = f.login_pair(Utc::now() - Duration::hours(2)).await;

        let auth = f
            .authenticator
            .authenticate(Some(&pair.access_token), Some(&pair.refresh_token))
            .await
            .unwrap();

        let rotated = auth.rotated.clone().unwrap();
        assert_eq!(auth.access_token, rotated.access_token);
        assert_ne!(rotated.refresh_token, pair.refresh_token);
        assert_eq!(
            f.slot().await,
            Some(refresh_token_digest(&rotated.refresh_token))
        );
        assert!(f.tokens.verify_access_token(&rotated.access_token).is_ok());
    }

    #[tokio::test]
    async fn test_refresh_only_rotates() {
        let f = fixture().await;
        let pair = f.login_pair(Utc::now()).await;

        let auth = f
            .authenticator
            .authenticate(None, Some(&pair.refresh_token))
            .await
            .unwrap();
        assert!(auth.was_rotated());
    }

    #[tokio::test]
    async fn test_expired_refresh_is_session_expired() {
        let f = fixture().await;
        let pair = f.login_pair(Utc::now() - Duration::days(8)).await;

        let result = f
            .authenticator
            .authenticate(Some(&pair.access_token), Some(&pair.refresh_token))
            .await;
        assert_eq!(auth_err(result), AuthError::SessionExpired);
    }

    #[tokio::test]
    async fn test_reuse_after_rotation_is_revoked_and_clears_slot() {
        let f = fixture().await;
        let r1 = f.login_pair(Utc::now()).await.refresh_token;

        let rotated = f.authenticator.rotate(&r1).await.unwrap().rotated.unwrap();
        assert!(f.slot().await.is_some());

        assert_eq!(
            auth_err(f.authenticator.rotate(&r1).await),
            AuthError::RevokedToken
        );
        assert!(f.slot().await.is_none());

        // The legitimate holder of R2 is logged out as well
        assert_eq!(
            auth_err(f.authenticator.rotate(&rotated.refresh_token).await),
            AuthError::RevokedToken
        );
    }

    #[tokio::test]
    async fn test_refresh_after_logout_is_revoked() {
        let f = fixture().await;
        let pair = f.login_pair(Utc::now()).await;
        f.repo.clear_refresh_token(f.user.id).await.unwrap();

        assert_eq!(
            auth_err(f.authenticator.rotate(&pair.refresh_token).await),
            AuthError::RevokedToken
        );
    }

    #[tokio::test]
    async fn test_refresh_for_deleted_user_is_revoked() {
        let f = fixture().await;
        let stranger = TokenSubject::new(uuid::Uuid::new_v4(), "user");
        let token = f.tokens.issue_refresh_token(&stranger).unwrap();

        assert_eq!(
            auth_err(f.authenticator.rotate(&token).await),
            AuthError::RevokedToken
        );
    }

    #[tokio::test]
    async fn test_valid_access_for_missing_user() {
        let f = fixture().await;
        let stranger = TokenSubject::new(uuid::Uuid::new_v4(), "user");
        let token = f.tokens.issue_access_token(&stranger).unwrap();

        let result = f.authenticator.authenticate(Some(&token), None).await;
        assert_eq!(auth_err(result), AuthError::UserNotFound);
    }

    #[test]
    fn test_authorize() {
        let principal = User::new("Asha", "+919999999999").with_role("admin").to_principal();
        assert!(authorize(&principal, &["admin"]).is_ok());
        assert_eq!(
            authorize(&principal, &["superuser"]),
            Err(AuthError::InsufficientPermissions)
        );
    }
}
