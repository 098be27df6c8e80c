//! Shared application state and HTTP error mapping.

use std::sync::Arc;

use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use governor::{clock::DefaultClock, state::InMemoryState, state::NotKeyed, RateLimiter};

use innboard_db::{StorageBackend, UrlSigner};

use crate::services::{RehydrationService, SigningService};

/// Global (un-keyed) rate limiter type.
pub type GlobalRateLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Generate-and-sign pipeline.
    pub signing: Arc<SigningService>,
    /// Rehydration (latest-document) service.
    pub rehydrate: Arc<RehydrationService>,
    /// Object storage backend, for grant-validated file retrieval.
    pub storage: Arc<dyn StorageBackend>,
    /// Grant issuer/verifier.
    pub signer: UrlSigner,
    /// Global rate limiter (None if rate limiting is disabled).
    pub rate_limiter: Option<Arc<GlobalRateLimiter>>,
}

// =============================================================================
// ERROR HANDLING
// =============================================================================

#[derive(Debug)]
pub enum ApiError {
    Internal(innboard_core::Error),
    Unauthorized(String),
    NotFound(String),
    BadRequest(String),
    TooManyRequests,
}

impl From<innboard_core::Error> for ApiError {
    fn from(err: innboard_core::Error) -> Self {
        match &err {
            innboard_core::Error::NotFound(msg) => ApiError::NotFound(msg.clone()),
            innboard_core::Error::InvalidInput(msg) => ApiError::BadRequest(msg.clone()),
            innboard_core::Error::MissingFields(_) => ApiError::BadRequest(err.to_string()),
            innboard_core::Error::InvalidGrant(msg) => ApiError::Unauthorized(msg.clone()),
            _ => ApiError::Internal(err),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match self {
            ApiError::Internal(err) => (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::TooManyRequests => (
                StatusCode::TOO_MANY_REQUESTS,
                "Rate limit exceeded".to_string(),
            ),
        };

        let body = Json(serde_json::json!({
            "error": message,
        }));

        (status, body).into_response()
    }
}
