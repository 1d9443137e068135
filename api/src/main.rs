use actix_web::{web, HttpServer};
use anyhow::Context;
use tracing::info;
use tracing_subscriber::EnvFilter;

use pa_api::{create_app, AppState};
use pa_shared::config::AppConfig;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = AppConfig::from_env().context("failed to read configuration")?;
    config.validate().context("invalid configuration")?;

    info!(
        environment = %config.environment,
        store = ?config.store,
        otp_mode = ?config.otp.mode,
        "Starting PhoneAuth API server"
    );

    // Signing or store failures abort startup
    let state = web::Data::new(AppState::from_config(&config).await?);

    let bind_address = config.server.bind_address();
    info!("Server will bind to: {}", bind_address);

    let mut server = HttpServer::new(move || create_app(state.clone()));
    if config.server.workers > 0 {
        server = server.workers(config.server.workers);
    }

    server
        .bind(&bind_address)
        .with_context(|| format!("cannot bind {}", bind_address))?
        .run()
        .await?;

    Ok(())
}
