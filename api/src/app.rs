//! Application factory
//!
//! Builds the actix-web `App` around the shared [`AppState`].

use actix_web::{
    body::MessageBody,
    dev::{ServiceFactory, ServiceRequest, ServiceResponse},
    error::InternalError,
    web, App, HttpResponse,
};
use tracing_actix_web::TracingLogger;

use crate::config::AppState;
use crate::dto::ErrorResponse;
use crate::middleware::{create_cors, SecurityMiddleware, SessionGuard};
use crate::routes::auth::{logout, me, refresh_token, send_otp, verify_otp};

/// Create and configure the application with all dependencies
pub fn create_app(
    state: web::Data<AppState>,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse<impl MessageBody>,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    let cors = create_cors(&state.cors, state.environment);
    let security = SecurityMiddleware::for_environment(state.environment);
    let rate_limiter = state.rate_limiter.middleware();

    App::new()
        .app_data(state)
        .app_data(json_config())
        // Middleware order: the last wrap runs first
        .wrap(security)
        .wrap(cors)
        .wrap(TracingLogger::default())
        .route("/health", web::get().to(health_check))
        .service(
            web::scope("/api/auth")
                .wrap(rate_limiter)
                .route("/send-otp", web::post().to(send_otp))
                .route("/verify-otp", web::post().to(verify_otp))
                .route("/refresh-token", web::post().to(refresh_token))
                .service(
                    web::resource("/logout")
                        .wrap(SessionGuard::optional())
                        .route(web::post().to(logout)),
                )
                .service(
                    web::resource("/me")
                        .wrap(SessionGuard::required())
                        .route(web::get().to(me)),
                ),
        )
        .default_service(web::route().to(not_found))
}

/// Malformed JSON bodies get the same error shape as everything else
fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, _req| {
        let body = ErrorResponse::new("invalid_body", err.to_string());
        InternalError::from_response(err, HttpResponse::BadRequest().json(body)).into()
    })
}

/// Health check endpoint handler
async fn health_check(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "healthy",
        "service": "phone-auth-api",
        "version": env!("CARGO_PKG_VERSION"),
        "environment": state.environment.to_string(),
        "otpMode": format!("{:?}", state.auth_service.otp_mode()).to_lowercase(),
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}

/// Default 404 handler
async fn not_found(req: actix_web::HttpRequest) -> HttpResponse {
    HttpResponse::NotFound().json(ErrorResponse::new(
        "not_found",
        format!("Not Found - {}", req.path()),
    ))
}
