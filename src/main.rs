//! SignDesk Gateway - Contract and e-signature BFF
//!
//! A Backend-for-Frontend (BFF) gateway in front of the document, user and
//! company API. This gateway:
//!
//! - Logs users in and keeps the upstream token in an HttpOnly cookie
//! - Guards page routes by session and admin role
//! - Validates and forwards API calls to the upstream
//! - Composes multi-step calls (upload then send, tracking enrichment)
//!
//! The browser talks only to this gateway, never directly to the upstream.

use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use signdesk::{config, metrics, routes};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "signdesk=debug,tower_http=debug".into());
    let json_logs = std::env::var("LOG_FORMAT").is_ok_and(|f| f.eq_ignore_ascii_case("json"));

    if json_logs {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }

    tracing::info!("Starting SignDesk Gateway v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let app_config = config::AppConfig::load().map_err(|e| {
        tracing::error!("Failed to load configuration: {}", e);
        anyhow::anyhow!("Configuration error: {}", e)
    })?;

    tracing::info!(
        "Configuration loaded. Server will listen on {}:{}",
        app_config.server.host,
        app_config.server.port
    );
    tracing::info!(
        upstream = %app_config.upstream.base_url,
        environment = %app_config.server.environment,
        "Upstream configured"
    );

    metrics::register_metrics();

    // Initialize application state
    let state = Arc::new(config::AppState::new(app_config.clone())?);

    let app = routes::app(state);

    // Start the server
    let addr = SocketAddr::from((
        app_config
            .server
            .host
            .parse::<std::net::IpAddr>()
            .unwrap_or([127, 0, 0, 1].into()),
        app_config.server.port,
    ));

    tracing::info!("Listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
    tracing::info!("Shutting down");
}
