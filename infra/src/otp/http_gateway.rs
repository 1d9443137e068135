//! HTTP client for the SMS OTP gateway
//!
//! The provider generates and checks codes itself:
//! - send: `POST {base}/{key}/SMS/{phone}/AUTOGEN/{template}`
//! - verify: `POST {base}/{key}/SMS/VERIFY3/{phone}/{code}`
//!
//! Both answer `{"Status": "...", "Details": "..."}`; only `Status == "Success"`
//! on an HTTP 200 counts as success.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tracing::{info, warn};

use pa_core::OtpGateway;
use pa_shared::config::OtpGatewayConfig;
use pa_shared::phone::mask_phone_number;

use crate::InfrastructureError;

const SUCCESS_STATUS: &str = "Success";

/// Body returned by every gateway endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct GatewayResponse {
    #[serde(rename = "Status")]
    pub status: String,

    /// Session id on send, a human readable verdict on verify
    #[serde(rename = "Details", default)]
    pub details: String,
}

impl GatewayResponse {
    pub fn is_success(&self) -> bool {
        self.status == SUCCESS_STATUS
    }
}

/// Gateway client backed by `reqwest`
#[derive(Clone)]
pub struct HttpOtpGateway {
    client: Client,
    base_url: String,
    api_key: String,
    template: String,
}

impl HttpOtpGateway {
    /// Build a client from configuration
    pub fn new(config: &OtpGatewayConfig) -> Result<Self, InfrastructureError> {
        if config.base_url.is_empty() || config.api_key.is_empty() {
            return Err(InfrastructureError::Config(
                "OTP gateway requires OTP_URL and OTP_API_KEY".to_string(),
            ));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            template: config.template.clone(),
        })
    }

    pub fn send_url(&self, phone: &str) -> String {
        format!(
            "{}/{}/SMS/{}/AUTOGEN/{}",
            self.base_url, self.api_key, phone, self.template
        )
    }

    pub fn verify_url(&self, phone: &str, code: &str) -> String {
        format!(
            "{}/{}/SMS/VERIFY3/{}/{}",
            self.base_url, self.api_key, phone, code
        )
    }

    /// POST to the gateway and decode its body.
    ///
    /// A body that is not a gateway response becomes an `Error` status so
    /// callers see a uniform shape.
    async fn call(&self, url: &str) -> Result<(StatusCode, GatewayResponse), InfrastructureError> {
        let response = self.client.post(url).send().await?;
        let status = response.status();
        let body = response.text().await?;

        let parsed = serde_json::from_str::<GatewayResponse>(&body).unwrap_or(GatewayResponse {
            status: "Error".to_string(),
            details: body,
        });

        Ok((status, parsed))
    }

    /// Request delivery of a fresh code; returns the gateway session id
    pub async fn send_code(&self, phone: &str) -> Result<String, InfrastructureError> {
        let (status, body) = self.call(&self.send_url(phone)).await?;

        if status != StatusCode::OK || !body.is_success() {
            warn!(
                phone = %mask_phone_number(phone),
                http_status = status.as_u16(),
                details = %body.details,
                "OTP gateway refused send"
            );
            return Err(InfrastructureError::Gateway(format!(
                "send failed with HTTP {}: {}",
                status.as_u16(),
                body.details
            )));
        }

        info!(
            target: "otp_gateway",
            phone = %mask_phone_number(phone),
            session_id = %body.details,
            "OTP sent via gateway"
        );
        Ok(body.details)
    }

    /// Ask the gateway to check a code.
    ///
    /// Server errors and transport failures are errors; any other
    /// non-success answer is a mismatch.
    pub async fn verify_code(&self, phone: &str, code: &str) -> Result<bool, InfrastructureError> {
        let (status, body) = self.call(&self.verify_url(phone, code)).await?;

        if status.is_server_error() {
            return Err(InfrastructureError::Gateway(format!(
                "verify failed with HTTP {}: {}",
                status.as_u16(),
                body.details
            )));
        }

        let accepted = status == StatusCode::OK && body.is_success();
        if !accepted {
            info!(
                phone = %mask_phone_number(phone),
                details = %body.details,
                "OTP rejected by gateway"
            );
        }
        Ok(accepted)
    }
}

#[async_trait]
impl OtpGateway for HttpOtpGateway {
    async fn send(&self, phone: &str) -> Result<String, String> {
        self.send_code(phone).await.map_err(|e| e.to_string())
    }

    async fn verify_remote(&self, phone: &str, code: &str) -> Result<bool, String> {
        self.verify_code(phone, code).await.map_err(|e| e.to_string())
    }
}
