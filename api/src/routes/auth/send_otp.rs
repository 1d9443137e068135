use actix_web::{web, HttpResponse};
use validator::Validate;

use pa_shared::phone::{mask_phone_number, normalize_phone_number};

use crate::config::AppState;
use crate::dto::{SendOtpRequest, SendOtpResponse};
use crate::handlers::ApiError;

/// Handler for POST /api/auth/send-otp
///
/// Starts an OTP challenge for a registered phone number. With the local
/// backend the generated code is echoed back as `otp`.
///
/// # Request Body
///
/// ```json
/// { "phoneNumber": "+919999999999" }
/// ```
///
/// # Errors
/// - 400 Bad Request: invalid phone number, or no such user
/// - 502 Bad Gateway: the SMS gateway refused the send
pub async fn send_otp(
    state: web::Data<AppState>,
    request: web::Json<SendOtpRequest>,
) -> Result<HttpResponse, ApiError> {
    request.validate().map_err(|e| ApiError::validation(&e))?;

    let phone = normalize_phone_number(&request.phone_number);
    tracing::info!(phone = %mask_phone_number(&phone), "Processing send-otp request");

    let dispatch = state
        .auth_service
        .request_otp(&phone)
        .await
        .map_err(ApiError::login)?;

    let message = if dispatch.code.is_some() {
        "OTP sent successfully. Please check your phone."
    } else {
        "OTP sent"
    };

    Ok(HttpResponse::Ok().json(SendOtpResponse {
        message: message.to_string(),
        delivery_id: dispatch.delivery_id,
        expires_at: dispatch.expires_at,
        otp: dispatch.code,
    }))
}
