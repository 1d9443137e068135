//! Shared fixtures for the HTTP tests

#![allow(dead_code)]

use std::sync::Arc;

use actix_web::cookie::Cookie;
use actix_web::dev::ServiceResponse;
use actix_web::web;

use pa_api::AppState;
use pa_core::{
    refresh_token_digest, AuthService, InMemoryUserRepository, LocalBackend, OtpBackend, OtpEngine,
    TokenConfig, TokenPair, TokenService, TokenSubject, User, UserRepository,
};
use pa_shared::config::AppConfig;

pub const PHONE: &str = "+919999999999";

pub fn test_config(extra: &[(&str, &str)]) -> AppConfig {
    let mut pairs: Vec<(String, String)> = vec![
        ("JWT_ACCESS_SECRET".into(), "test-access-secret".into()),
        ("JWT_REFRESH_SECRET".into(), "test-refresh-secret".into()),
        ("USER_STORE".into(), "memory".into()),
    ];
    pairs.extend(extra.iter().map(|(k, v)| (k.to_string(), v.to_string())));

    let lookup = move |key: &str| {
        pairs
            .iter()
            .rev()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.clone())
    };
    AppConfig::from_lookup(&lookup).expect("test config")
}

pub struct TestContext {
    pub repo: InMemoryUserRepository,
    pub state: web::Data<AppState>,
}

impl TestContext {
    /// Local OTP backend over an in-memory store
    pub fn new(config: AppConfig) -> Self {
        let repo = InMemoryUserRepository::new();
        let store: Arc<dyn UserRepository> = Arc::new(repo.clone());
        let backend: Arc<dyn OtpBackend> = Arc::new(LocalBackend::new(OtpEngine::new(
            store.clone(),
            config.otp.clone(),
        )));
        Self::with_backend(config, repo, backend)
    }

    pub fn with_backend(
        config: AppConfig,
        repo: InMemoryUserRepository,
        backend: Arc<dyn OtpBackend>,
    ) -> Self {
        let token_config = TokenConfig::from_jwt_config(&config.jwt).expect("token config");
        let tokens = Arc::new(TokenService::new(token_config).expect("token service"));
        let auth_service = Arc::new(AuthService::new(Arc::new(repo.clone()), backend, tokens));

        Self {
            repo,
            state: web::Data::new(AppState::new(auth_service, &config).expect("app state")),
        }
    }

    pub fn tokens(&self) -> &TokenService {
        self.state.auth_service.token_service()
    }

    pub async fn seed_user(&self) -> User {
        self.repo
            .create(User::new("Asha", PHONE))
            .await
            .expect("seed user")
    }

    /// Issue a pair for `user` and make its refresh token the live one
    pub async fn login_pair(&self, user: &User) -> TokenPair {
        let pair = self.tokens().issue_pair(&TokenSubject::from(user)).expect("pair");
        self.repo
            .set_refresh_token(user.id, Some(&refresh_token_digest(&pair.refresh_token)))
            .await
            .expect("store slot");
        pair
    }
}

/// Cookies set by a response, by name
pub fn response_cookie<B>(resp: &ServiceResponse<B>, name: &str) -> Option<Cookie<'static>> {
    resp.response()
        .cookies()
        .find(|c| c.name() == name)
        .map(|c| c.into_owned())
}

/// Whether the response removes the cookie `name`
pub fn clears_cookie<B>(resp: &ServiceResponse<B>, name: &str) -> bool {
    response_cookie(resp, name)
        .map(|c| c.value().is_empty())
        .unwrap_or(false)
}
