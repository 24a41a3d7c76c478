//! Envelope ledger API server.
//!
//! Main entry point for the budgeting backend.

use std::path::Path;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use envelope_api::{AppState, create_router};
use envelope_core::retry::RetryPolicy;
use envelope_db::LedgerClient;
use envelope_shared::AppConfig;
use envelope_shared::config::LoggingConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    let config = AppConfig::load().context("loading configuration")?;
    init_tracing(&config.logging);

    let ledger = LedgerClient::connect(&config.database, RetryPolicy::from(&config.ledger))
        .await
        .context("opening ledger database")?;
    info!(in_memory = config.database.is_in_memory(), "Connected to database");

    let frontend_dir = config.server.frontend_dir.as_deref().map(Path::new);
    if let Some(dir) = frontend_dir {
        info!(dir = %dir.display(), "Serving frontend assets");
    }
    let app = create_router(AppState::new(ledger), frontend_dir);

    let addr = config.bind_address();
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

/// Installs the global subscriber. `RUST_LOG` wins over the configured level.
fn init_tracing(logging: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));

    let registry = tracing_subscriber::registry().with(filter);
    if logging.json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install terminate handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => info!("Received Ctrl+C, shutting down"),
        () = terminate => info!("Received terminate signal, shutting down"),
    }
}
