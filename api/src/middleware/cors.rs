//! CORS middleware configuration for cross-origin requests.
//!
//! Credentials (the session cookies) are always allowed. Development accepts
//! any origin; other environments only accept `ALLOWED_ORIGINS`.

use actix_cors::Cors;
use actix_web::http::{header, Method};

use pa_shared::config::{CorsConfig, Environment};

/// Creates a CORS middleware instance configured for the given environment.
pub fn create_cors(config: &CorsConfig, environment: Environment) -> Cors {
    if environment.is_development() {
        create_development_cors(config)
    } else {
        create_production_cors(config)
    }
}

fn base_cors(config: &CorsConfig) -> Cors {
    Cors::default()
        .allowed_methods(vec![Method::GET, Method::POST, Method::OPTIONS])
        .allowed_headers(vec![
            header::AUTHORIZATION,
            header::ACCEPT,
            header::CONTENT_TYPE,
            header::HeaderName::from_static("x-requested-with"),
        ])
        .expose_headers(vec![
            header::HeaderName::from_static("x-ratelimit-limit"),
            header::HeaderName::from_static("x-ratelimit-remaining"),
            header::HeaderName::from_static("x-ratelimit-after"),
            header::RETRY_AFTER,
        ])
        .max_age(config.max_age)
        .supports_credentials()
}

fn create_development_cors(config: &CorsConfig) -> Cors {
    tracing::info!("Configuring CORS for development environment");
    base_cors(config).allow_any_origin()
}

fn create_production_cors(config: &CorsConfig) -> Cors {
    tracing::info!(origins = config.allowed_origins.len(), "Configuring CORS for production environment");

    config
        .allowed_origins
        .iter()
        .map(|origin| origin.trim())
        .filter(|origin| !origin.is_empty())
        .fold(base_cors(config), |cors, origin| cors.allowed_origin(origin))
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{test, web, App, HttpResponse};

    async fn ok() -> HttpResponse {
        HttpResponse::Ok().finish()
    }

    fn cors_config() -> CorsConfig {
        CorsConfig {
            allowed_origins: vec!["https://app.example.com".to_string()],
            ..Default::default()
        }
    }

    #[actix_web::test]
    async fn test_production_allows_configured_origin_with_credentials() {
        let app = test::init_service(
            App::new()
                .wrap(create_cors(&cors_config(), Environment::Production))
                .route("/test", web::get().to(ok)),
        )
        .await;

        let req = test::TestRequest::get()
            .uri("/test")
            .insert_header((header::ORIGIN, "https://app.example.com"))
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert!(resp.status().is_success());
        assert_eq!(
            resp.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
            "https://app.example.com"
        );
        assert_eq!(
            resp.headers().get(header::ACCESS_CONTROL_ALLOW_CREDENTIALS).unwrap(),
            "true"
        );
    }

    #[actix_web::test]
    async fn test_development_echoes_any_origin() {
        let app = test::init_service(
            App::new()
                .wrap(create_cors(&CorsConfig::default(), Environment::Development))
                .route("/test", web::get().to(ok)),
        )
        .await;

        let req = test::TestRequest::get()
            .uri("/test")
            .insert_header((header::ORIGIN, "http://localhost:3000"))
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(
            resp.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
            "http://localhost:3000"
        );
    }
}
