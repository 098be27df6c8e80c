//! PostgreSQL implementation of TenantDirectory.

use async_trait::async_trait;
use innboard_core::{Error, Result, TenantDirectory};
use sqlx::{Pool, Postgres};
use uuid::Uuid;

#[derive(Clone)]
pub struct PgTenantDirectory {
    pool: Pool<Postgres>,
}

impl PgTenantDirectory {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TenantDirectory for PgTenantDirectory {
    async fn display_name(&self, tenant_id: Uuid) -> Result<Option<String>> {
        let name = sqlx::query_scalar::<_, String>(
            r#"
            SELECT name
            FROM tenant
            WHERE id = $1
            "#,
        )
        .bind(tenant_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(name)
    }
}
