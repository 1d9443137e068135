use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use pa_core::Principal;
use pa_shared::phone::is_valid_phone;

pub fn validate_phone_number(phone: &str) -> Result<(), ValidationError> {
    if is_valid_phone(phone.trim()) {
        Ok(())
    } else {
        let mut error = ValidationError::new("phone_format");
        error.message = Some("Invalid Phone number format".into());
        Err(error)
    }
}

pub fn validate_numeric(value: &str) -> Result<(), ValidationError> {
    if !value.is_empty() && value.chars().all(|c| c.is_ascii_digit()) {
        Ok(())
    } else {
        let mut error = ValidationError::new("numeric");
        error.message = Some("OTP must be numeric".into());
        Err(error)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SendOtpRequest {
    #[validate(
        length(min = 1, message = "Phone number is required"),
        custom = "validate_phone_number"
    )]
    pub phone_number: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct VerifyOtpRequest {
    #[validate(
        length(min = 1, message = "Phone number is required"),
        custom = "validate_phone_number"
    )]
    pub phone_number: String,

    #[validate(length(min = 1, message = "OTP is required"), custom = "validate_numeric")]
    pub otp: String,
}

impl VerifyOtpRequest {
    /// The code length is configured at runtime, so it is checked here
    /// rather than in the derive.
    pub fn check_otp_length(&self, expected: u32) -> Result<(), ValidationError> {
        if self.otp.chars().count() == expected as usize {
            Ok(())
        } else {
            let mut error = ValidationError::new("length");
            error.message = Some(format!("OTP must be {} digits", expected).into());
            Err(error)
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendOtpResponse {
    pub message: String,

    /// Gateway session id or local reference
    pub delivery_id: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,

    /// Echoed only when codes are generated locally
    #[serde(skip_serializing_if = "Option::is_none")]
    pub otp: Option<String>,
}

/// Login response: the principal plus a message
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthenticatedResponse {
    #[serde(flatten)]
    pub user: Principal,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentUserResponse {
    pub user: Principal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phone_formats() {
        assert!(validate_phone_number("+919999999999").is_ok());
        assert!(validate_phone_number("9876543210").is_ok());
        assert!(validate_phone_number("12345").is_err());
        assert!(validate_phone_number("+0123456789").is_err());
        assert!(validate_phone_number("98765abcde").is_err());
    }

    #[test]
    fn test_send_request_validation() {
        let ok = SendOtpRequest {
            phone_number: "+919999999999".to_string(),
        };
        assert!(ok.validate().is_ok());

        let empty = SendOtpRequest {
            phone_number: String::new(),
        };
        let errors = empty.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("phone_number"));
    }

    #[test]
    fn test_verify_request_validation() {
        let request = VerifyOtpRequest {
            phone_number: "+919999999999".to_string(),
            otp: "12a456".to_string(),
        };
        assert!(request.validate().is_err());

        let request = VerifyOtpRequest {
            phone_number: "+919999999999".to_string(),
            otp: "123456".to_string(),
        };
        assert!(request.validate().is_ok());
        assert!(request.check_otp_length(6).is_ok());
        assert!(request.check_otp_length(4).is_err());
    }

    #[test]
    fn test_request_uses_camel_case() {
        let request: VerifyOtpRequest =
            serde_json::from_str(r#"{"phoneNumber":"+919999999999","otp":"123456"}"#).unwrap();
        assert_eq!(request.phone_number, "+919999999999");
    }
}
