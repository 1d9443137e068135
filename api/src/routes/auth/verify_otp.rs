use actix_web::{web, HttpResponse};
use validator::{Validate, ValidationErrors};

use pa_shared::phone::normalize_phone_number;

use crate::config::AppState;
use crate::cookies::set_session_cookies;
use crate::dto::{AuthenticatedResponse, VerifyOtpRequest};
use crate::handlers::ApiError;

/// Handler for POST /api/auth/verify-otp
///
/// Checks the submitted code and opens a session: both credential cookies
/// are set and the user is returned.
///
/// # Request Body
///
/// ```json
/// { "phoneNumber": "+919999999999", "otp": "123456" }
/// ```
///
/// # Errors
/// - 400 Bad Request: validation failure, expired or missing challenge,
///   wrong code or unknown phone (the last two share one message)
pub async fn verify_otp(
    state: web::Data<AppState>,
    request: web::Json<VerifyOtpRequest>,
) -> Result<HttpResponse, ApiError> {
    let mut errors = match request.validate() {
        Ok(()) => ValidationErrors::new(),
        Err(errors) => errors,
    };
    if let Err(error) = request.check_otp_length(state.otp.length) {
        errors.add("otp", error);
    }
    if !errors.errors().is_empty() {
        return Err(ApiError::validation(&errors));
    }

    let phone = normalize_phone_number(&request.phone_number);
    let outcome = state
        .auth_service
        .login_with_otp(&phone, &request.otp)
        .await
        .map_err(ApiError::login)?;

    let mut response = HttpResponse::Ok();
    set_session_cookies(&mut response, &outcome.tokens, &state.cookies);

    Ok(response.json(AuthenticatedResponse {
        user: outcome.principal,
        message: "Authentication successful".to_string(),
    }))
}
