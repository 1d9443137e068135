//! Application state shared by every worker

use std::sync::Arc;

use anyhow::Context;
use pa_core::{
    AuthService, InMemoryUserRepository, LocalBackend, OtpBackend, OtpEngine, RemoteGatewayBackend,
    TokenConfig, TokenService, UserRepository,
};
use pa_infra::{DatabasePool, HttpOtpGateway, MySqlUserRepository};
use pa_shared::config::{
    AppConfig, ConfigError, CookieConfig, CorsConfig, Environment, OtpConfig, OtpMode, StoreKind,
};

use crate::middleware::rate_limit::RateLimiter;

/// Services and settings the handlers and middleware read
pub struct AppState {
    pub auth_service: Arc<AuthService>,
    pub environment: Environment,
    pub cookies: CookieConfig,
    pub otp: OtpConfig,
    pub cors: CorsConfig,
    /// Shared by all workers so the limit is per process, not per thread
    pub rate_limiter: RateLimiter,
}

impl AppState {
    /// Assemble state around an already wired auth service
    pub fn new(auth_service: Arc<AuthService>, config: &AppConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            auth_service,
            environment: config.environment,
            cookies: config.cookie.clone(),
            otp: config.otp.clone(),
            cors: config.cors.clone(),
            rate_limiter: RateLimiter::new(&config.rate_limit)?,
        })
    }

    /// Wire the store, OTP backend and token service from configuration.
    ///
    /// Fails on bad signing secrets, an unreachable database or an
    /// unusable gateway configuration; the binary treats that as fatal.
    pub async fn from_config(config: &AppConfig) -> anyhow::Result<Self> {
        let token_config =
            TokenConfig::from_jwt_config(&config.jwt).context("invalid token configuration")?;
        let token_service =
            Arc::new(TokenService::new(token_config).context("cannot build token service")?);

        let repository: Arc<dyn UserRepository> = match config.store {
            StoreKind::MySql => {
                let pool = DatabasePool::new(&config.database)
                    .await
                    .context("cannot connect to the user database")?;
                tracing::info!(stats = %pool.get_statistics(), "Using MySQL user store");
                Arc::new(MySqlUserRepository::new(pool.get_pool().clone()))
            }
            StoreKind::Memory => {
                tracing::warn!("Using in-memory user store; users are lost on restart");
                Arc::new(InMemoryUserRepository::new())
            }
        };

        let backend: Arc<dyn OtpBackend> = match config.otp.mode {
            OtpMode::Local => Arc::new(LocalBackend::new(OtpEngine::new(
                repository.clone(),
                config.otp.clone(),
            ))),
            OtpMode::Remote => {
                let gateway = HttpOtpGateway::new(&config.otp_gateway)
                    .context("cannot build OTP gateway client")?;
                Arc::new(RemoteGatewayBackend::new(Arc::new(gateway)))
            }
        };
        tracing::info!(mode = ?config.otp.mode, "OTP backend selected");

        let auth_service = Arc::new(AuthService::new(repository, backend, token_service));
        Self::new(auth_service, config).context("invalid rate limit configuration")
    }
}
