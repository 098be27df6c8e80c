//! PostgreSQL implementation of SignedDocumentRepository.
//!
//! `signed_document` is an append-only log: every signing event inserts a
//! new row, and "current" is defined as the most recent row per
//! (employee, form type). Older rows are retained as audit history and
//! never updated or deleted here.

use async_trait::async_trait;
use chrono::Utc;
use innboard_core::{
    Error, PersistedDocument, RecordSignedDocumentRequest, Result, SignedDocumentRepository,
};
use sqlx::{Pool, Postgres, Row};
use uuid::Uuid;

#[derive(Clone)]
pub struct PgSignedDocumentRepository {
    pool: Pool<Postgres>,
}

impl PgSignedDocumentRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    fn row_to_document(row: &sqlx::postgres::PgRow) -> PersistedDocument {
        PersistedDocument {
            id: row.get("id"),
            tenant_id: row.get("tenant_id"),
            employee_id: row.get("employee_id"),
            form_type: row.get("form_type"),
            storage_path: row.get("storage_path"),
            bucket: row.get("bucket"),
            static_url: row.get("static_url"),
            status: row.get("status"),
            created_at: row.get("created_at"),
        }
    }
}

#[async_trait]
impl SignedDocumentRepository for PgSignedDocumentRepository {
    async fn insert(&self, req: RecordSignedDocumentRequest) -> Result<Uuid> {
        let id = Uuid::now_v7();
        sqlx::query(
            r#"
            INSERT INTO signed_document
                (id, tenant_id, employee_id, form_type, storage_path, bucket,
                 static_url, status, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, 'signed', $8)
            "#,
        )
        .bind(id)
        .bind(req.tenant_id)
        .bind(req.employee_id)
        .bind(&req.form_type)
        .bind(&req.storage_path)
        .bind(&req.bucket)
        .bind(&req.static_url)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(id)
    }

    async fn latest(
        &self,
        employee_id: Uuid,
        form_type: &str,
    ) -> Result<Option<PersistedDocument>> {
        let row = sqlx::query(
            r#"
            SELECT id, tenant_id, employee_id, form_type, storage_path, bucket,
                   static_url, status, created_at
            FROM signed_document
            WHERE employee_id = $1 AND form_type = $2
            ORDER BY created_at DESC, id DESC
            LIMIT 1
            "#,
        )
        .bind(employee_id)
        .bind(form_type)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(row.map(|r| Self::row_to_document(&r)))
    }
}
