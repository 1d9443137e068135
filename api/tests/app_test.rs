//! Application-level routes and middleware

mod common;

use std::sync::Arc;

use actix_web::{http::StatusCode, test};
use serde_json::{json, Value};

use common::{response_cookie, test_config, TestContext, PHONE};
use pa_api::create_app;
use pa_core::{InMemoryUserRepository, OtpBackend, RemoteGatewayBackend};
use pa_infra::MockOtpGateway;

#[actix_web::test]
async fn test_health_check() {
    let ctx = TestContext::new(test_config(&[]));
    let app = test::init_service(create_app(ctx.state.clone())).await;

    let req = test::TestRequest::get().uri("/health").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["otpMode"], "local");
}

#[actix_web::test]
async fn test_unknown_route_returns_json_404() {
    let ctx = TestContext::new(test_config(&[]));
    let app = test::init_service(create_app(ctx.state.clone())).await;

    let req = test::TestRequest::get().uri("/nope").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["message"], "Not Found - /nope");
}

#[actix_web::test]
async fn test_security_headers_present() {
    let ctx = TestContext::new(test_config(&[]));
    let app = test::init_service(create_app(ctx.state.clone())).await;

    let req = test::TestRequest::get().uri("/health").to_request();
    let resp = test::call_service(&app, req).await;

    let headers = resp.headers();
    assert_eq!(headers.get("x-content-type-options").unwrap(), "nosniff");
    assert_eq!(headers.get("x-frame-options").unwrap(), "DENY");
}

#[actix_web::test]
async fn test_auth_routes_are_rate_limited() {
    let ctx = TestContext::new(test_config(&[("AUTH_LIMIT", "2")]));
    ctx.seed_user().await;
    let app = test::init_service(create_app(ctx.state.clone())).await;

    for _ in 0..2 {
        let req = test::TestRequest::post()
            .uri("/api/auth/send-otp")
            .set_json(json!({ "phoneNumber": PHONE }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert!(resp.headers().contains_key("x-ratelimit-remaining"));
    }

    let req = test::TestRequest::post()
        .uri("/api/auth/send-otp")
        .set_json(json!({ "phoneNumber": PHONE }))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::TOO_MANY_REQUESTS);
    assert!(resp.headers().contains_key("retry-after"));

    // health is outside the limited scope
    let req = test::TestRequest::get().uri("/health").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
}

#[actix_web::test]
async fn test_spoofed_forwarded_for_does_not_reset_the_limit() {
    let ctx = TestContext::new(test_config(&[("AUTH_LIMIT", "2")]));
    let app = test::init_service(create_app(ctx.state.clone())).await;

    let mut limited = 0;
    for i in 0..10 {
        let req = test::TestRequest::post()
            .uri("/api/auth/verify-otp")
            .peer_addr("198.51.100.7:40000".parse().unwrap())
            .insert_header(("x-forwarded-for", format!("203.0.113.{}", i)))
            .set_json(json!({ "phoneNumber": PHONE, "otp": "123456" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        if resp.status() == StatusCode::TOO_MANY_REQUESTS {
            assert!(resp.headers().contains_key("retry-after"));
            limited += 1;
        }
    }

    assert_eq!(limited, 8);
}

#[actix_web::test]
async fn test_trusted_proxy_limits_each_forwarded_client() {
    let ctx = TestContext::new(test_config(&[
        ("AUTH_LIMIT", "1"),
        ("TRUSTED_PROXIES", "10.0.0.1"),
    ]));
    let app = test::init_service(create_app(ctx.state.clone())).await;

    for client in ["203.0.113.1", "203.0.113.2"] {
        let req = test::TestRequest::post()
            .uri("/api/auth/verify-otp")
            .peer_addr("10.0.0.1:40000".parse().unwrap())
            .insert_header(("x-forwarded-for", client))
            .set_json(json!({ "phoneNumber": PHONE, "otp": "123456" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_ne!(resp.status(), StatusCode::TOO_MANY_REQUESTS);
    }

    let req = test::TestRequest::post()
        .uri("/api/auth/verify-otp")
        .peer_addr("10.0.0.1:40000".parse().unwrap())
        .insert_header(("x-forwarded-for", "203.0.113.1"))
        .set_json(json!({ "phoneNumber": PHONE, "otp": "123456" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::TOO_MANY_REQUESTS);
}

fn remote_context(gateway: MockOtpGateway) -> TestContext {
    let repo = InMemoryUserRepository::new();
    let backend: Arc<dyn OtpBackend> = Arc::new(RemoteGatewayBackend::new(Arc::new(gateway)));
    TestContext::with_backend(test_config(&[]), repo, backend)
}

#[actix_web::test]
async fn test_remote_backend_login_flow() {
    let gateway = MockOtpGateway::default();
    let ctx = remote_context(gateway.clone());
    ctx.seed_user().await;
    let app = test::init_service(create_app(ctx.state.clone())).await;

    let req = test::TestRequest::post()
        .uri("/api/auth/send-otp")
        .set_json(json!({ "phoneNumber": PHONE }))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["message"], "OTP sent");
    assert!(body.get("otp").is_none());
    assert!(body["deliveryId"].as_str().unwrap().starts_with("mock_"));
    assert_eq!(gateway.sent_count(), 1);

    let req = test::TestRequest::post()
        .uri("/api/auth/verify-otp")
        .set_json(json!({ "phoneNumber": PHONE, "otp": "654321" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let req = test::TestRequest::post()
        .uri("/api/auth/verify-otp")
        .set_json(json!({ "phoneNumber": PHONE, "otp": "123456" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(response_cookie(&resp, "jwt").is_some());
}

#[actix_web::test]
async fn test_remote_send_failure_is_bad_gateway() {
    let gateway = MockOtpGateway::default();
    gateway.set_simulate_failure(true);
    let ctx = remote_context(gateway);
    ctx.seed_user().await;
    let app = test::init_service(create_app(ctx.state.clone())).await;

    let req = test::TestRequest::post()
        .uri("/api/auth/send-otp")
        .set_json(json!({ "phoneNumber": PHONE }))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "otp_delivery_failed");
}
