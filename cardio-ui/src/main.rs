//! cardio-ui - CardioSense web front end
//!
//! **Module Identity:**
//! - Name: cardio-ui
//! - Port: 5780 (default)
//!
//! Talks to the inference backend over HTTP (`/predict`, `/health`, `/`) and
//! serves the upload/result page to the browser.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use cardio_common::config::{ConfigOverrides, UiConfig};
use cardio_common::events::EventBus;
use clap::Parser;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cardio_ui::client::{PredictionBackend, PredictionClient};
use cardio_ui::{build_router, AppState};

/// Command-line arguments for cardio-ui
#[derive(Parser, Debug)]
#[command(name = "cardio-ui")]
#[command(about = "CardioSense cardiac analysis web front end")]
#[command(version)]
struct Args {
    /// Base URL of the inference backend
    #[arg(long)]
    api_base_url: Option<String>,

    /// Port to listen on
    #[arg(short, long, env = "CARDIO_UI_PORT")]
    port: Option<u16>,

    /// Address to bind
    #[arg(long)]
    bind: Option<String>,

    /// TOML config file
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cardio_ui=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Build identification first, before anything that can fail
    info!(
        "Starting CardioSense UI (cardio-ui) v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    let args = Args::parse();

    let overrides = ConfigOverrides {
        api_base_url: args.api_base_url,
        port: args.port,
        bind: args.bind,
        config_path: args.config,
    };
    let config = UiConfig::resolve(&overrides).context("Failed to resolve configuration")?;
    info!(
        "Inference backend: {} (from {})",
        config.api_base_url, config.api_base_url_source
    );

    let client = PredictionClient::with_timeout(&config.api_base_url, config.request_timeout)
        .context("Failed to create backend client")?;
    let backend: Arc<dyn PredictionBackend> = Arc::new(client);

    // Reachability is informational; the page reports failures per request
    match backend.health().await {
        Ok(true) => info!("✓ Inference backend is healthy"),
        Ok(false) => warn!("Inference backend answered but is not healthy"),
        Err(e) => warn!("Inference backend not reachable yet: {}", e),
    }

    let event_bus = EventBus::new(100);
    info!("Event bus initialized");

    let state = AppState::new(backend, event_bus);
    let app = build_router(state);

    let address = config.listen_address();
    let listener = match tokio::net::TcpListener::bind(&address).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Failed to bind {}: {}", address, e);
            return Err(e).context("Failed to bind to address");
        }
    };
    info!("cardio-ui listening on http://{}", address);
    info!("Health check: http://{}/health", address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
