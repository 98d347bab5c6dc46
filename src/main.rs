//! Istikhara HTTP server.

use std::sync::Arc;

use istikhara::adapters::{build_app, GeminiProvider, GuidanceAppState};
use istikhara::config::AppConfig;
use istikhara::telemetry::{init_tracing, LogFormat};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load()?;

    let format = if config.is_production() {
        LogFormat::Json
    } else {
        LogFormat::Pretty
    };
    init_tracing(&config.server.log_level, format);

    config.validate()?;
    config.warn_if_unconfigured();

    let provider = GeminiProvider::new(config.ai.gemini_config())?;
    let state = GuidanceAppState::new(Arc::new(provider));
    let app = build_app(state, &config.server.cors_origins_list());

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, model = %config.ai.model, "Istikhara service listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
