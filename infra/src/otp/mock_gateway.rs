//! Mock OTP gateway
//!
//! Accepts one fixed code for every number and counts deliveries. Used for
//! development against the remote backend without an SMS provider.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};
use uuid::Uuid;

use pa_core::OtpGateway;
use pa_shared::phone::mask_phone_number;

/// Gateway double with a fixed accepted code
#[derive(Clone)]
pub struct MockOtpGateway {
    /// Code that `verify_remote` accepts
    accepted_code: String,
    /// Counter for tracking number of codes sent
    sent_count: Arc<AtomicU64>,
    /// Whether to simulate failures (for testing)
    simulate_failure: Arc<AtomicBool>,
}

impl MockOtpGateway {
    pub fn new(accepted_code: impl Into<String>) -> Self {
        Self {
            accepted_code: accepted_code.into(),
            sent_count: Arc::new(AtomicU64::new(0)),
            simulate_failure: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Get the total number of codes sent
    pub fn sent_count(&self) -> u64 {
        self.sent_count.load(Ordering::SeqCst)
    }

    /// Enable or disable failure simulation
    pub fn set_simulate_failure(&self, simulate: bool) {
        self.simulate_failure.store(simulate, Ordering::SeqCst);
    }

    fn failing(&self) -> bool {
        self.simulate_failure.load(Ordering::SeqCst)
    }
}

impl Default for MockOtpGateway {
    fn default() -> Self {
        Self::new("123456")
    }
}

#[async_trait]
impl OtpGateway for MockOtpGateway {
    async fn send(&self, phone: &str) -> Result<String, String> {
        if self.failing() {
            warn!(phone = %mask_phone_number(phone), "Mock gateway simulating send failure");
            return Err("Simulated gateway failure".to_string());
        }

        let session_id = format!("mock_{}", Uuid::new_v4());
        let count = self.sent_count.fetch_add(1, Ordering::SeqCst) + 1;

        info!(
            target: "otp_gateway",
            provider = "mock",
            phone = %mask_phone_number(phone),
            session_id = %session_id,
            count,
            "OTP sent (mock)"
        );
        Ok(session_id)
    }

    async fn verify_remote(&self, _phone: &str, code: &str) -> Result<bool, String> {
        if self.failing() {
            return Err("Simulated gateway failure".to_string());
        }
        Ok(code == self.accepted_code)
    }
}
