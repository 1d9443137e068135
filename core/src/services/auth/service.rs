//! Main authentication service implementation

use std::sync::Arc;

use pa_shared::config::OtpMode;
use pa_shared::phone::mask_phone_number;

use crate::domain::entities::token::TokenSubject;
use crate::domain::entities::user::{Principal, User};
use crate::domain::value_objects::{Authentication, LoginOutcome, OtpDispatch};
use crate::errors::{AuthError, DomainError, DomainResult};
use crate::repositories::UserRepository;
use crate::services::otp::OtpBackend;
use crate::services::session::SessionAuthenticator;
use crate::services::token::{refresh_token_digest, TokenService};

/// Authentication service for the OTP login and session flows
pub struct AuthService {
    /// User store
    user_repository: Arc<dyn UserRepository>,
    /// Local engine or remote gateway, fixed at startup
    otp_backend: Arc<dyn OtpBackend>,
    /// Token signing and verification
    token_service: Arc<TokenService>,
    /// Per-request authentication and rotation
    authenticator: SessionAuthenticator,
}

impl AuthService {
    /// Create a new authentication service
    ///
    /// # Arguments
    ///
    /// * `user_repository` - Store holding user records and refresh slots
    /// * `otp_backend` - Backend issuing and checking OTP challenges
    /// * `token_service` - Service for JWT management
    pub fn new(
        user_repository: Arc<dyn UserRepository>,
        otp_backend: Arc<dyn OtpBackend>,
        token_service: Arc<TokenService>,
    ) -> Self {
        let authenticator =
            SessionAuthenticator::new(token_service.clone(), user_repository.clone());
        Self {
            user_repository,
            otp_backend,
            token_service,
            authenticator,
        }
    }

    pub fn token_service(&self) -> &TokenService {
        &self.token_service
    }

    pub fn otp_mode(&self) -> OtpMode {
        self.otp_backend.mode()
    }

    /// Start an OTP challenge for a registered phone number
    ///
    /// # Returns
    ///
    /// * `Ok(OtpDispatch)` - challenge issued; `code` is set only by the local backend
    /// * `Err(AuthError::UserNotFound)` - no user with this phone number
    /// * `Err(AuthError::DeliveryFailed)` - the gateway could not send
    pub async fn request_otp(&self, phone_number: &str) -> DomainResult<OtpDispatch> {
        let mut user = self.find_user(phone_number, "otp_request_unknown_phone").await?;
        self.otp_backend.dispatch(&mut user).await
    }

    /// Verify an OTP and open a session
    ///
    /// On success the user is marked verified, a fresh pair is issued and its
    /// refresh digest replaces whatever the slot held before.
    pub async fn login_with_otp(&self, phone_number: &str, code: &str) -> DomainResult<LoginOutcome> {
        let mut user = self.find_user(phone_number, "login_unknown_phone").await?;

        self.otp_backend.verify(&mut user, code).await?;

        if !user.is_verified {
            self.user_repository.mark_verified(user.id).await?;
            user.verify();
        }

        let tokens = self.token_service.issue_pair(&TokenSubject::from(&user))?;
        self.user_repository
            .set_refresh_token(user.id, Some(&refresh_token_digest(&tokens.refresh_token)))
            .await?;

        tracing::info!(
            user_id = %user.id,
            phone = %mask_phone_number(&user.phone_number),
            event = "login_succeeded",
            "User logged in with OTP"
        );

        Ok(LoginOutcome {
            principal: user.to_principal(),
            tokens,
        })
    }

    /// Authenticate a request from whatever credentials it carried
    pub async fn authenticate(
        &self,
        access_token: Option<&str>,
        refresh_token: Option<&str>,
    ) -> DomainResult<Authentication> {
        self.authenticator.authenticate(access_token, refresh_token).await
    }

    /// Explicit refresh: rotate the presented refresh token
    pub async fn refresh(&self, refresh_token: Option<&str>) -> DomainResult<Authentication> {
        match refresh_token.filter(|t| !t.is_empty()) {
            Some(token) => self.authenticator.rotate(token).await,
            None => Err(AuthError::Unauthenticated.into()),
        }
    }

    /// Clear the refresh slot of the logged-in principal, if there is one.
    ///
    /// Clearing client credentials is the transport's job and happens either way.
    pub async fn logout(&self, principal: Option<&Principal>) -> DomainResult<()> {
        if let Some(principal) = principal {
            self.user_repository.clear_refresh_token(principal.id).await?;
            tracing::info!(user_id = %principal.id, event = "logout", "User logged out");
        }
        Ok(())
    }

    async fn find_user(&self, phone_number: &str, miss_event: &'static str) -> DomainResult<User> {
        let phone_number = phone_number.trim();
        if phone_number.is_empty() {
            return Err(DomainError::Validation {
                message: "phone number is required".to_string(),
            });
        }

        match self.user_repository.find_by_phone(phone_number).await? {
            Some(user) => Ok(user),
            None => {
                tracing::warn!(
                    phone = %mask_phone_number(phone_number),
                    event = miss_event,
                    "No user registered with this phone number"
                );
                Err(AuthError::UserNotFound.into())
            }
        }
    }
}
