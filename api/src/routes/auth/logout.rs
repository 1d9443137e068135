use actix_web::{web, HttpResponse};

use crate::config::AppState;
use crate::cookies::clear_session_cookies;
use crate::dto::MessageResponse;
use crate::handlers::ApiError;
use crate::middleware::OptionalAuth;

/// Handler for POST /api/auth/logout
///
/// Always clears both credential cookies. When the request carried a
/// valid session the user's refresh slot is emptied as well.
pub async fn logout(
    state: web::Data<AppState>,
    auth: OptionalAuth,
) -> Result<HttpResponse, ApiError> {
    let principal = auth.0.as_ref().map(|ctx| &ctx.principal);

    state
        .auth_service
        .logout(principal)
        .await
        .map_err(|e| ApiError::session(e, &state.cookies))?;

    let mut response = HttpResponse::Ok();
    clear_session_cookies(&mut response, &state.cookies);
    Ok(response.json(MessageResponse::new("User logged out successfully")))
}
