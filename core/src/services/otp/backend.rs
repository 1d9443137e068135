//! OTP backends: where a challenge lives and who checks it

use std::sync::Arc;

use async_trait::async_trait;
use pa_shared::config::OtpMode;
use pa_shared::phone::mask_phone_number;

use crate::domain::entities::user::User;
use crate::domain::value_objects::OtpDispatch;
use crate::errors::{AuthError, DomainResult};

use super::engine::OtpEngine;
use super::traits::OtpGateway;

/// Issues and verifies OTP challenges for a user.
///
/// Selected once at startup from [`OtpMode`].
#[async_trait]
pub trait OtpBackend: Send + Sync {
    fn mode(&self) -> OtpMode;

    /// Start a challenge for `user`
    async fn dispatch(&self, user: &mut User) -> DomainResult<OtpDispatch>;

    /// Check a submitted code; `Ok(())` exactly once per challenge
    async fn verify(&self, user: &mut User, code: &str) -> DomainResult<()>;
}

/// Challenges generated here and stored on the user record
pub struct LocalBackend {
    engine: OtpEngine,
}

impl LocalBackend {
    pub fn new(engine: OtpEngine) -> Self {
        Self { engine }
    }
}

#[async_trait]
impl OtpBackend for LocalBackend {
    fn mode(&self) -> OtpMode {
        OtpMode::Local
    }

    async fn dispatch(&self, user: &mut User) -> DomainResult<OtpDispatch> {
        let code = self.engine.issue_challenge(user).await?;
        Ok(OtpDispatch {
            delivery_id: format!("local-{}", user.id),
            expires_at: user.otp_expires_at,
            code: Some(code),
        })
    }

    async fn verify(&self, user: &mut User, code: &str) -> DomainResult<()> {
        self.engine.verify_challenge(user, code).await
    }
}

/// Challenges owned by an external SMS gateway; user OTP fields stay untouched
pub struct RemoteGatewayBackend {
    gateway: Arc<dyn OtpGateway>,
}

impl RemoteGatewayBackend {
    pub fn new(gateway: Arc<dyn OtpGateway>) -> Self {
        Self { gateway }
    }
}

#[async_trait]
impl OtpBackend for RemoteGatewayBackend {
    fn mode(&self) -> OtpMode {
        OtpMode::Remote
    }

    async fn dispatch(&self, user: &mut User) -> DomainResult<OtpDispatch> {
        let delivery_id = self.gateway.send(&user.phone_number).await.map_err(|reason| {
            tracing::error!(
                phone = %mask_phone_number(&user.phone_number),
                error = %reason,
                event = "otp_delivery_failed",
                "OTP gateway send failed"
            );
            AuthError::DeliveryFailed { reason }
        })?;

        tracing::info!(
            user_id = %user.id,
            phone = %mask_phone_number(&user.phone_number),
            delivery_id = %delivery_id,
            event = "otp_issued",
            "OTP sent through gateway"
        );

        Ok(OtpDispatch {
            delivery_id,
            expires_at: None,
            code: None,
        })
    }

    async fn verify(&self, user: &mut User, code: &str) -> DomainResult<()> {
        let accepted = self
            .gateway
            .verify_remote(&user.phone_number, code.trim())
            .await
            .map_err(|reason| AuthError::DeliveryFailed { reason })?;

        if accepted {
            tracing::info!(user_id = %user.id, event = "otp_verified", "OTP verified by gateway");
            Ok(())
        } else {
            tracing::warn!(user_id = %user.id, event = "otp_mismatch", "Gateway rejected OTP");
            Err(AuthError::ChallengeMismatch.into())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::DomainError;
    use crate::repositories::{InMemoryUserRepository, UserRepository};
    use pa_shared::config::OtpConfig;
    use std::sync::Mutex;

    struct StubGateway {
        fail_send: bool,
        expected_code: String,
        sent_to: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl OtpGateway for StubGateway {
        async fn send(&self, phone: &str) -> Result<String, String> {
            if self.fail_send {
                return Err("gateway unreachable".to_string());
            }
            self.sent_to.lock().unwrap().push(phone.to_string());
            Ok("session-1".to_string())
        }

        async fn verify_remote(&self, _phone: &str, code: &str) -> Result<bool, String> {
            Ok(code == self.expected_code)
        }
    }

    fn stub(fail_send: bool) -> Arc<StubGateway> {
        Arc::new(StubGateway {
            fail_send,
            expected_code: "4321".to_string(),
            sent_to: Mutex::new(Vec::new()),
        })
    }

    #[tokio::test]
    async fn test_local_dispatch_returns_code() {
        let repo = InMemoryUserRepository::new();
        let mut user = repo.create(User::new("Asha", "+919999999999")).await.unwrap();
        let backend = LocalBackend::new(OtpEngine::new(Arc::new(repo.clone()), OtpConfig::default()));

        let dispatch = backend.dispatch(&mut user).await.unwrap();
        let code = dispatch.code.clone().unwrap();

        assert_eq!(backend.mode(), OtpMode::Local);
        assert_eq!(dispatch.expires_at, user.otp_expires_at);
        assert!(backend.verify(&mut user, &code).await.is_ok());
    }

    #[tokio::test]
    async fn test_remote_backend_leaves_user_fields_alone() {
        let repo = InMemoryUserRepository::new();
        let mut user = repo.create(User::new("Asha", "+919999999999")).await.unwrap();
        let gateway = stub(false);
        let backend = RemoteGatewayBackend::new(gateway.clone());

        let dispatch = backend.dispatch(&mut user).await.unwrap();
        assert_eq!(dispatch.delivery_id, "session-1");
        assert!(dispatch.code.is_none());
        assert!(user.otp_code.is_none());
        assert_eq!(gateway.sent_to.lock().unwrap().as_slice(), ["+919999999999"]);

        assert!(backend.verify(&mut user, "4321").await.is_ok());
        let stored = repo.find_by_id(user.id).await.unwrap().unwrap();
        assert!(stored.otp_code.is_none());
    }

    #[tokio::test]
    async fn test_remote_rejection_is_mismatch() {
        let mut user = User::new("Asha", "+919999999999");
        let backend = RemoteGatewayBackend::new(stub(false));

        let result = backend.verify(&mut user, "0000").await;
        assert!(matches!(
            result,
            Err(DomainError::Auth(AuthError::ChallengeMismatch))
        ));
    }

    #[tokio::test]
    async fn test_remote_send_failure() {
        let mut user = User::new("Asha", "+919999999999");
        let backend = RemoteGatewayBackend::new(stub(true));

        let result = backend.dispatch(&mut user).await;
        assert!(matches!(
            result,
            Err(DomainError::Auth(AuthError::DeliveryFailed { .. }))
        ));
    }
}
