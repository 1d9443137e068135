//! OTP gateway clients
//!
//! - [`HttpOtpGateway`]: the SMS provider's HTTP API (AUTOGEN send, VERIFY3 check)
//! - [`MockOtpGateway`]: scripted gateway for development and tests

mod http_gateway;
mod mock_gateway;

pub use http_gateway::{GatewayResponse, HttpOtpGateway};
pub use mock_gateway::MockOtpGateway;
