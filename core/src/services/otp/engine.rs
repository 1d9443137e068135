//! OTP challenges kept on the user record

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use constant_time_eq::constant_time_eq;
use pa_shared::config::OtpConfig;
use pa_shared::phone::mask_phone_number;

use crate::domain::entities::user::User;
use crate::errors::{AuthError, DomainResult};
use crate::repositories::UserRepository;

use super::generator::generate_code;

/// Issues and checks challenges stored in `otp_code` / `otp_expires_at`
pub struct OtpEngine {
    repository: Arc<dyn UserRepository>,
    config: OtpConfig,
}

impl OtpEngine {
    pub fn new(repository: Arc<dyn UserRepository>, config: OtpConfig) -> Self {
        Self { repository, config }
    }

    /// Configured challenge lifetime
    pub fn ttl(&self) -> Duration {
        Duration::minutes(i64::from(self.config.ttl_minutes))
    }

    /// Generate a code, attach it to `user` with the configured TTL and persist.
    ///
    /// Any unconsumed challenge is overwritten. Returns the issued code.
    pub async fn issue_challenge(&self, user: &mut User) -> DomainResult<String> {
        self.issue_challenge_with_ttl(user, self.ttl()).await
    }

    pub async fn issue_challenge_with_ttl(
        &self,
        user: &mut User,
        ttl: Duration,
    ) -> DomainResult<String> {
        let code = generate_code(self.config.length)?;
        let expires_at = Utc::now() + ttl;

        self.repository
            .set_challenge(user.id, &code, expires_at)
            .await?;
        user.otp_code = Some(code.clone());
        user.otp_expires_at = Some(expires_at);
        user.touch();

        tracing::info!(
            user_id = %user.id,
            phone = %mask_phone_number(&user.phone_number),
            expires_at = %expires_at,
            event = "otp_issued",
            "OTP challenge issued"
        );

        Ok(code)
    }

    /// Check `submitted` against the user's active challenge
    pub async fn verify_challenge(&self, user: &mut User, submitted: &str) -> DomainResult<()> {
        self.verify_challenge_at(user, submitted, Utc::now()).await
    }

    /// Same as [`Self::verify_challenge`] with an explicit clock.
    ///
    /// Expiry is checked before the code, so a stale challenge is destroyed
    /// even when the submitted code is wrong. Only the observed challenge is
    /// cleared; one issued concurrently survives.
    pub async fn verify_challenge_at(
        &self,
        user: &mut User,
        submitted: &str,
        now: DateTime<Utc>,
    ) -> DomainResult<()> {
        let Some(stored) = user.otp_code.clone() else {
            return Err(AuthError::NoActiveChallenge.into());
        };

        let expired = user.otp_expires_at.map_or(true, |expires_at| expires_at < now);
        if expired {
            self.repository.consume_challenge(user.id, &stored).await?;
            user.clear_challenge();
            tracing::info!(
                user_id = %user.id,
                event = "otp_expired",
                "Stale OTP challenge discarded"
            );
            return Err(AuthError::ChallengeExpired.into());
        }

        if !constant_time_eq(stored.as_bytes(), submitted.trim().as_bytes()) {
            tracing::warn!(
                user_id = %user.id,
                event = "otp_mismatch",
                "OTP mismatch"
            );
            return Err(AuthError::ChallengeMismatch.into());
        }

        if !self.repository.consume_challenge(user.id, &stored).await? {
            // Another request consumed or replaced it first
            user.clear_challenge();
            return Err(AuthError::NoActiveChallenge.into());
        }

        user.clear_challenge();
        tracing::info!(user_id = %user.id, event = "otp_verified", "OTP verified");
        Ok(())
    }
}
