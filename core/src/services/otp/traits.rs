//! Trait for external OTP gateway integration

use async_trait::async_trait;

/// SMS gateway that generates, delivers and checks codes on its side
#[async_trait]
pub trait OtpGateway: Send + Sync {
    /// Deliver a fresh code to `phone`, returning the gateway's session id
    async fn send(&self, phone: &str) -> Result<String, String>;

    /// Ask the gateway whether `code` is the one it sent to `phone`
    async fn verify_remote(&self, phone: &str, code: &str) -> Result<bool, String>;
}
