//! Core traits for innboard abstractions.
//!
//! These traits define the interfaces that concrete implementations must
//! satisfy, enabling pluggable backends and testability. The database
//! layer provides Postgres implementations; tests supply in-memory fakes.

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::Result;
use crate::models::*;

/// Append-only log of persisted signed documents.
///
/// Writes are always inserts; "current" is defined by the most recent row
/// per (employee, form type), so no locking discipline is needed.
#[async_trait]
pub trait SignedDocumentRepository: Send + Sync {
    /// Insert a new signed document row. Never updates an existing row.
    async fn insert(&self, req: RecordSignedDocumentRequest) -> Result<Uuid>;

    /// Fetch the most recent row for (employee, form type), if any.
    async fn latest(&self, employee_id: Uuid, form_type: &str) -> Result<Option<PersistedDocument>>;
}

/// Read-only access to attachments written by the upload subsystem.
#[async_trait]
pub trait UploadRepository: Send + Sync {
    /// Fetch an uploaded attachment by id.
    async fn get(&self, id: Uuid) -> Result<Option<UploadedAttachment>>;

    /// Fetch the most recent upload of `kind` for an employee.
    async fn latest_for_kind(
        &self,
        employee_id: Uuid,
        kind: &str,
    ) -> Result<Option<UploadedAttachment>>;
}

/// Resolves tenant ids to human-readable tenant names.
///
/// Injectable so tests can supply a fake directory without touching real
/// storage; the API layer wraps it in a read-through cache.
#[async_trait]
pub trait TenantDirectory: Send + Sync {
    /// Look up the display name for a tenant, `None` if unknown.
    async fn display_name(&self, tenant_id: Uuid) -> Result<Option<String>>;
}
