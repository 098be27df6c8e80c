//! Document generation and rehydration endpoints.

use axum::extract::{Query, State};
use axum::http::HeaderMap;
use axum::Json;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use innboard_core::FormKind;

use crate::services::GenerateRequest;
use crate::state::{ApiError, AppState};

use super::check_rate_limit;

/// POST /api/v1/documents/generate
///
/// The body is accepted as a free-form object: `tenant_id`,
/// `employee_id`, and `form_type` are required envelope fields, while
/// form data, signature, and attachment references are extracted
/// leniently from the rest.
pub async fn generate_document(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<Value>,
) -> Result<Json<Value>, ApiError> {
    check_rate_limit(&state)?;

    let tenant_id = require_uuid(&payload, "tenant_id")?;
    let employee_id = require_uuid(&payload, "employee_id")?;
    let form: FormKind = require_str(&payload, "form_type")?.parse()?;

    let outcome = state
        .signing
        .generate(GenerateRequest {
            tenant_id,
            employee_id,
            form,
            payload,
            ip_address: header_str(&headers, "x-forwarded-for"),
            user_agent: header_str(&headers, "user-agent"),
        })
        .await?;

    let artifact = &outcome.artifact;
    Ok(Json(json!({
        "is_preview": artifact.is_preview,
        "signed": !artifact.is_preview,
        "persisted": outcome.persisted,
        "page_count": artifact.page_count,
        "all_attachments_merged": outcome.all_attachments_merged,
        "artifact_base64": BASE64.encode(&artifact.bytes),
        "storage_path": outcome.storage_path,
        "signed_url": outcome.grant.as_ref().map(|g| g.url.clone()),
        "expires_at": outcome.grant.as_ref().map(|g| g.expires_at),
    })))
}

#[derive(Debug, Deserialize)]
pub struct RehydrateParams {
    pub employee_id: Uuid,
    pub form_type: String,
}

/// GET /api/v1/documents/rehydrate?employee_id=...&form_type=...
pub async fn rehydrate_document(
    State(state): State<AppState>,
    Query(params): Query<RehydrateParams>,
) -> Result<Json<Value>, ApiError> {
    check_rate_limit(&state)?;

    let form: FormKind = params.form_type.parse()?;
    let outcome = state.rehydrate.rehydrate(params.employee_id, form).await?;

    Ok(Json(json!({
        "has_document": outcome.has_document,
        "signed_url": outcome.signed_url,
        "expires_at": outcome.expires_at,
        "filename": outcome.filename,
        "signed_at": outcome.signed_at,
    })))
}

fn header_str(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

fn require_str<'a>(payload: &'a Value, key: &str) -> Result<&'a str, ApiError> {
    payload
        .get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| ApiError::BadRequest(format!("Missing required field: {key}")))
}

fn require_uuid(payload: &Value, key: &str) -> Result<Uuid, ApiError> {
    let raw = require_str(payload, key)?;
    Uuid::parse_str(raw).map_err(|_| ApiError::BadRequest(format!("Invalid UUID in field: {key}")))
}
