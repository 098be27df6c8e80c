//! Object storage backend and signed retrieval grants.
//!
//! Storage is multi-tenant by path namespacing only: every artifact lives
//! under `{tenant_name}/{employee_id}/forms/{form_type}/...` inside one
//! shared backend. The backend trait allows abstracting over filesystem,
//! S3, or other storage providers; the filesystem backend here uses
//! atomic temp-file + rename writes.
//!
//! Retrieval links are HMAC-signed, time-bounded grants computed on
//! demand and never stored: two grants for the same object at different
//! instants differ, their target does not.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::path::PathBuf;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};
use uuid::Uuid;

use innboard_core::defaults::URL_TTL_SECS;
use innboard_core::{Error, Result, SignedUrlGrant};

type HmacSha256 = Hmac<Sha256>;

/// Storage backend trait for different storage implementations.
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Write data to the specified path.
    async fn write(&self, path: &str, data: &[u8]) -> Result<()>;

    /// Read data from the specified path.
    async fn read(&self, path: &str) -> Result<Vec<u8>>;

    /// Check if data exists at the specified path.
    async fn exists(&self, path: &str) -> Result<bool>;
}

/// Filesystem storage backend.
///
/// Stores objects under a base directory, mirroring the logical storage
/// path one-to-one.
pub struct FilesystemBackend {
    base_path: PathBuf,
}

impl FilesystemBackend {
    /// Create a new filesystem backend with the given base directory.
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    fn full_path(&self, path: &str) -> PathBuf {
        self.base_path.join(path)
    }

    /// Validate that the storage backend can write, read, and delete files.
    ///
    /// Performs a full round-trip test at startup to catch filesystem issues
    /// (overlayfs quirks, permission errors, missing directories) early.
    pub async fn validate(&self) -> std::result::Result<(), String> {
        let test_dir = self.base_path.join(".health-check");
        let test_file = test_dir.join("test.bin");

        fs::create_dir_all(&test_dir)
            .await
            .map_err(|e| format!("create_dir_all({:?}): {}", test_dir, e))?;

        let data = b"storage-health-check";
        fs::write(&test_file, data)
            .await
            .map_err(|e| format!("write({:?}): {}", test_file, e))?;

        let read_data = fs::read(&test_file)
            .await
            .map_err(|e| format!("read({:?}): {}", test_file, e))?;
        if read_data != data {
            return Err("read-back mismatch".to_string());
        }

        fs::remove_file(&test_file)
            .await
            .map_err(|e| format!("remove_file({:?}): {}", test_file, e))?;
        let _ = fs::remove_dir(&test_dir).await; // Best-effort cleanup

        Ok(())
    }
}

#[async_trait]
impl StorageBackend for FilesystemBackend {
    async fn write(&self, path: &str, data: &[u8]) -> Result<()> {
        let full_path = self.full_path(path);
        debug!(storage_path = %path, full_path = %full_path.display(), byte_len = data.len(), "object_store: write");

        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent).await.map_err(|e| {
                warn!(parent = %parent.display(), error = %e, "object_store: create_dir_all failed");
                e
            })?;
        }

        // Atomic write: temp file + rename
        let temp_path = full_path.with_extension("tmp");
        let mut file = fs::File::create(&temp_path).await.map_err(|e| {
            warn!(temp_path = %temp_path.display(), error = %e, "object_store: File::create failed");
            e
        })?;
        file.write_all(data).await.map_err(|e| {
            warn!(error = %e, "object_store: write_all failed");
            e
        })?;
        file.sync_all().await?;
        drop(file);

        fs::rename(&temp_path, &full_path).await.map_err(|e| {
            warn!(from = %temp_path.display(), to = %full_path.display(), error = %e, "object_store: rename failed");
            e
        })?;

        // Set permissions to 0644 (rw-r--r--, no execute)
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&full_path, std::fs::Permissions::from_mode(0o644)).await?;
        }

        Ok(())
    }

    async fn read(&self, path: &str) -> Result<Vec<u8>> {
        let full_path = self.full_path(path);
        Ok(fs::read(full_path).await?)
    }

    async fn exists(&self, path: &str) -> Result<bool> {
        let full_path = self.full_path(path);
        Ok(tokio::fs::try_exists(full_path).await?)
    }
}

/// Build the canonical storage path for a signed document.
///
/// Shape: `{tenant_name}/{employee_id}/forms/{form_type}/{unix_ts}_{uuid}.pdf`.
/// The tenant name is always a resolved value, never a hardcoded literal.
pub fn document_storage_path(tenant_name: &str, employee_id: Uuid, form_type: &str) -> String {
    format!(
        "{}/{}/forms/{}/{}_{}.pdf",
        tenant_name,
        employee_id,
        form_type,
        Utc::now().timestamp(),
        Uuid::new_v4()
    )
}

/// Issues and verifies time-bounded HMAC retrieval grants.
#[derive(Clone)]
pub struct UrlSigner {
    secret: String,
    base_url: String,
}

impl UrlSigner {
    /// Create a signer. `base_url` is the public origin grants are rooted
    /// at, without a trailing slash.
    pub fn new(secret: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            base_url: base_url.into(),
        }
    }

    /// Issue a fresh grant for a storage path, valid for the default TTL.
    pub fn issue(&self, storage_path: &str) -> Result<SignedUrlGrant> {
        self.issue_with_ttl(storage_path, Duration::seconds(URL_TTL_SECS))
    }

    /// Issue a fresh grant with an explicit validity window.
    pub fn issue_with_ttl(&self, storage_path: &str, ttl: Duration) -> Result<SignedUrlGrant> {
        let expires_at: DateTime<Utc> = Utc::now() + ttl;
        let expires_unix = expires_at.timestamp();
        let signature = self.sign(storage_path, expires_unix)?;
        let encoded_path = Self::encode_path(storage_path);

        Ok(SignedUrlGrant {
            url: format!(
                "{}/api/v1/files/{}?expires={}&signature={}",
                self.base_url, encoded_path, expires_unix, signature
            ),
            expires_at,
        })
    }

    /// Verify a presented grant: not expired, signature matches the path.
    pub fn verify(&self, storage_path: &str, expires_unix: i64, signature: &str) -> Result<()> {
        if expires_unix < Utc::now().timestamp() {
            return Err(Error::InvalidGrant("grant expired".to_string()));
        }

        let raw = hex::decode(signature)
            .map_err(|_| Error::InvalidGrant("malformed signature".to_string()))?;
        let mut mac = self.mac()?;
        mac.update(Self::message(storage_path, expires_unix).as_bytes());
        mac.verify_slice(&raw)
            .map_err(|_| Error::InvalidGrant("signature mismatch".to_string()))
    }

    fn sign(&self, storage_path: &str, expires_unix: i64) -> Result<String> {
        let mut mac = self.mac()?;
        mac.update(Self::message(storage_path, expires_unix).as_bytes());
        Ok(hex::encode(mac.finalize().into_bytes()))
    }

    fn mac(&self) -> Result<HmacSha256> {
        HmacSha256::new_from_slice(self.secret.as_bytes())
            .map_err(|e| Error::Config(format!("invalid signing secret: {e}")))
    }

    fn message(storage_path: &str, expires_unix: i64) -> String {
        format!("{storage_path}\n{expires_unix}")
    }

    /// Percent-encode each path segment, preserving separators.
    fn encode_path(storage_path: &str) -> String {
        storage_path
            .split('/')
            .map(|segment| urlencoding::encode(segment).into_owned())
            .collect::<Vec<_>>()
            .join("/")
    }
}
