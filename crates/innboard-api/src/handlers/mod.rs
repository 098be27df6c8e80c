//! HTTP handlers: parse, delegate, shape.

pub mod documents;
pub mod files;

use axum::response::IntoResponse;
use axum::Json;

use crate::state::{ApiError, AppState};

/// Liveness probe.
pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Global rate limit check, applied by the document handlers.
pub(crate) fn check_rate_limit(state: &AppState) -> Result<(), ApiError> {
    if let Some(limiter) = &state.rate_limiter {
        if limiter.check().is_err() {
            tracing::warn!("Rate limit exceeded");
            return Err(ApiError::TooManyRequests);
        }
    }
    Ok(())
}
