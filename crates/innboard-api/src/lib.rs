//! innboard-api - HTTP API server for the innboard document subsystem.
//!
//! The binary in `main.rs` wires configuration, the database, and the
//! object storage backend into [`state::AppState`] and serves the router;
//! everything else lives here so integration tests can drive the pipeline
//! services directly.

pub mod handlers;
pub mod services;
pub mod state;

use axum::routing::{get, post};
use axum::Router;

use state::AppState;

/// Build the API router over shared application state.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route(
            "/api/v1/documents/generate",
            post(handlers::documents::generate_document),
        )
        .route(
            "/api/v1/documents/rehydrate",
            get(handlers::documents::rehydrate_document),
        )
        .route("/api/v1/files/*path", get(handlers::files::fetch_file))
        .with_state(state)
}
