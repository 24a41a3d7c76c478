//! HTTP API layer with Axum routes.
//!
//! This crate provides:
//! - REST routes over the ledger client
//! - Error to response mapping

pub mod error;
pub mod routes;

use std::path::Path;

use axum::Router;
use envelope_db::LedgerClient;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

pub use error::{ApiError, ApiResult};

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Ledger client. Clones share the pool and retry metrics.
    pub ledger: LedgerClient,
}

impl AppState {
    /// Wraps a ledger client.
    #[must_use]
    pub const fn new(ledger: LedgerClient) -> Self {
        Self { ledger }
    }
}

/// Creates the main application router.
///
/// Requests outside `/api` fall through to `frontend_dir` when given.
pub fn create_router(state: AppState, frontend_dir: Option<&Path>) -> Router {
    let router = Router::new().nest("/api", routes::api_routes());

    let router = match frontend_dir {
        Some(dir) => router.fallback_service(ServeDir::new(dir)),
        None => router,
    };

    router
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
