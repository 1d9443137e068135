use actix_web::HttpResponse;

use crate::dto::CurrentUserResponse;
use crate::middleware::AuthContext;

/// Handler for GET /api/auth/me
///
/// Returns the authenticated principal. Rotated cookies, if any, are
/// attached by the session guard.
pub async fn me(auth: AuthContext) -> HttpResponse {
    HttpResponse::Ok().json(CurrentUserResponse { user: auth.principal })
}
