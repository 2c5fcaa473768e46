// Main entry point for the extraction API server

use anyhow::{Context, Result};
use server_core::{app::AppState, build_app, build_ladder, Config};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,cookcard=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load .env if present, then configuration
    dotenvy::dotenv().ok();
    let config = Config::from_env().context("Failed to load configuration")?;
    tracing::info!("Configuration loaded");

    let (ladder, store) = build_ladder(
        cookcard::LadderConfig::default(),
        config.openai_api_key.clone(),
        config.apify_token.clone(),
    );

    let app = build_app(AppState {
        ladder,
        store,
        started_at: chrono::Utc::now(),
    });

    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("Starting cook card API on {}", addr);
    tracing::info!("Extract endpoint: POST http://localhost:{}/v1/extract", config.port);
    tracing::info!("Health check: http://localhost:{}/health", config.port);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .context("Failed to bind to address")?;

    // connect-info service so the IP rate limiter can key by peer address
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<std::net::SocketAddr>(),
    )
    .await
    .context("Server error")?;

    Ok(())
}
