//! PostgreSQL implementation of UploadRepository.
//!
//! `uploaded_attachment` rows are written by the external upload
//! subsystem; this repository only reads them, as the metadata resolver's
//! database fallback chain (by id, then by (employee, kind) most recent
//! first).

use async_trait::async_trait;
use innboard_core::{Error, Result, UploadRepository, UploadedAttachment};
use sqlx::{Pool, Postgres, Row};
use uuid::Uuid;

#[derive(Clone)]
pub struct PgUploadRepository {
    pool: Pool<Postgres>,
}

impl PgUploadRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    fn row_to_upload(row: &sqlx::postgres::PgRow) -> UploadedAttachment {
        UploadedAttachment {
            id: row.get("id"),
            tenant_id: row.get("tenant_id"),
            employee_id: row.get("employee_id"),
            kind: row.get("kind"),
            storage_path: row.get("storage_path"),
            bucket: row.get("bucket"),
            content_type: row.get("content_type"),
            created_at: row.get("created_at"),
        }
    }
}

#[async_trait]
impl UploadRepository for PgUploadRepository {
    async fn get(&self, id: Uuid) -> Result<Option<UploadedAttachment>> {
        let row = sqlx::query(
            r#"
            SELECT id, tenant_id, employee_id, kind, storage_path, bucket,
                   content_type, created_at
            FROM uploaded_attachment
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(row.map(|r| Self::row_to_upload(&r)))
    }

    async fn latest_for_kind(
        &self,
        employee_id: Uuid,
        kind: &str,
    ) -> Result<Option<UploadedAttachment>> {
        let row = sqlx::query(
            r#"
            SELECT id, tenant_id, employee_id, kind, storage_path, bucket,
                   content_type, created_at
            FROM uploaded_attachment
            WHERE employee_id = $1 AND kind = $2
            ORDER BY created_at DESC, id DESC
            LIMIT 1
            "#,
        )
        .bind(employee_id)
        .bind(kind)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(row.map(|r| Self::row_to_upload(&r)))
    }
}
