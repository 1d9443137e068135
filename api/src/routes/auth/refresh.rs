use actix_web::{web, HttpRequest, HttpResponse};

use crate::config::AppState;
use crate::cookies::{set_session_cookies, Credentials};
use crate::dto::MessageResponse;
use crate::handlers::ApiError;

/// Handler for POST /api/auth/refresh-token
///
/// Rotates the session from the `refreshToken` cookie and sets the new
/// pair as cookies.
///
/// # Errors
/// - 401 Unauthorized: no refresh token presented
/// - 403 Forbidden: refresh token expired, invalid, superseded or reused;
///   both cookies are cleared
pub async fn refresh_token(
    req: HttpRequest,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    let credentials = Credentials::from_request(&req, &state.cookies);

    let authentication = state
        .auth_service
        .refresh(credentials.refresh())
        .await
        .map_err(|e| ApiError::session(e, &state.cookies))?;

    let mut response = HttpResponse::Ok();
    if let Some(pair) = &authentication.rotated {
        set_session_cookies(&mut response, pair, &state.cookies);
    }

    Ok(response.json(MessageResponse::new("Access token refreshed successfully.")))
}
