//! # innboard-db
//!
//! PostgreSQL database layer and object storage for innboard.
//!
//! This crate provides:
//! - Connection pool management
//! - Repository implementations for signed documents, uploaded
//!   attachments, and the tenant directory
//! - A pluggable object storage backend (filesystem implementation
//!   included) with HMAC-signed, time-bounded retrieval grants
//!
//! ## Example
//!
//! ```rust,ignore
//! use innboard_db::Database;
//! use innboard_core::SignedDocumentRepository;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let db = Database::connect("postgres://localhost/innboard").await?;
//!     let latest = db.documents.latest(employee_id, "direct_deposit").await?;
//!     Ok(())
//! }
//! ```

pub mod documents;
pub mod object_store;
pub mod pool;
pub mod tenants;
pub mod uploads;

pub use documents::PgSignedDocumentRepository;
pub use object_store::{document_storage_path, FilesystemBackend, StorageBackend, UrlSigner};
pub use pool::{create_pool, create_pool_with_config, PoolConfig};
pub use tenants::PgTenantDirectory;
pub use uploads::PgUploadRepository;

// Re-export core types
pub use innboard_core::*;

/// Aggregated database handle exposing every repository.
pub struct Database {
    /// The underlying connection pool.
    pub pool: sqlx::Pool<sqlx::Postgres>,
    /// Append-only signed document log.
    pub documents: PgSignedDocumentRepository,
    /// Read-only uploaded attachment lookups.
    pub uploads: PgUploadRepository,
    /// Tenant id → display name directory.
    pub tenants: PgTenantDirectory,
}

impl Database {
    /// Build a database handle from an existing pool.
    pub fn new(pool: sqlx::Pool<sqlx::Postgres>) -> Self {
        Self {
            documents: PgSignedDocumentRepository::new(pool.clone()),
            uploads: PgUploadRepository::new(pool.clone()),
            tenants: PgTenantDirectory::new(pool.clone()),
            pool,
        }
    }

    /// Connect with default pool configuration.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = create_pool(database_url).await?;
        Ok(Self::new(pool))
    }

    /// Connect with custom pool configuration.
    pub async fn connect_with_config(database_url: &str, config: PoolConfig) -> Result<Self> {
        let pool = create_pool_with_config(database_url, config).await?;
        Ok(Self::new(pool))
    }

    /// Run pending migrations.
    #[cfg(feature = "migrations")]
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("../../migrations")
            .run(&self.pool)
            .await
            .map_err(|e| Error::Database(sqlx::Error::Migrate(Box::new(e))))?;
        Ok(())
    }

    /// Get the underlying connection pool.
    pub fn pool(&self) -> &sqlx::Pool<sqlx::Postgres> {
        &self.pool
    }
}

impl Clone for Database {
    fn clone(&self) -> Self {
        Self::new(self.pool.clone())
    }
}
