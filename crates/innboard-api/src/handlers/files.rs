//! Grant-validated file retrieval.
//!
//! The files endpoint is the target of every issued grant URL. It never
//! serves anything without a valid, unexpired signature over the exact
//! storage path being requested.

use axum::extract::{Path, Query, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use serde::Deserialize;
use tracing::debug;

use crate::state::{ApiError, AppState};

#[derive(Debug, Deserialize)]
pub struct GrantParams {
    pub expires: i64,
    pub signature: String,
}

/// GET /api/v1/files/*path?expires=...&signature=...
pub async fn fetch_file(
    State(state): State<AppState>,
    Path(path): Path<String>,
    Query(grant): Query<GrantParams>,
) -> Result<Response, ApiError> {
    // Axum hands us the wildcard segment percent-decoded, which is the
    // raw storage path the grant was signed over.
    state.signer.verify(&path, grant.expires, &grant.signature)?;

    let bytes = state.storage.read(&path).await.map_err(|e| match e {
        innboard_core::Error::Io(ref io) if io.kind() == std::io::ErrorKind::NotFound => {
            ApiError::NotFound(format!("No stored object at {path}"))
        }
        other => ApiError::from(other),
    })?;

    debug!(storage_path = %path, byte_len = bytes.len(), "files: serving stored object");

    let filename = path.rsplit('/').next().unwrap_or("document.pdf");
    let disposition = format!("inline; filename=\"{filename}\"");

    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        bytes,
    )
        .into_response())
}
