//! Read-through LRU cache over the tenant directory.
//!
//! Storage paths embed the tenant's display name, so every signing
//! request needs one lookup. Names change rarely; a small cache keeps the
//! directory out of the hot path.

use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::error;
use uuid::Uuid;

use innboard_core::defaults::TENANT_CACHE_CAPACITY;
use innboard_core::TenantDirectory;

/// Caching tenant-name resolver.
#[derive(Clone)]
pub struct TenantNameCache {
    directory: Arc<dyn TenantDirectory>,
    cache: Arc<Mutex<LruCache<Uuid, String>>>,
}

impl TenantNameCache {
    pub fn new(directory: Arc<dyn TenantDirectory>) -> Self {
        let capacity =
            NonZeroUsize::new(TENANT_CACHE_CAPACITY).expect("Cache capacity must be non-zero");
        Self {
            directory,
            cache: Arc::new(Mutex::new(LruCache::new(capacity))),
        }
    }

    /// Resolve a tenant id to its display name.
    ///
    /// An unknown tenant or a directory failure yields the placeholder
    /// `tenant-{id}` so document generation can proceed; the placeholder
    /// is never cached, so a later fix to the directory heals new paths
    /// immediately.
    pub async fn resolve(&self, tenant_id: Uuid) -> String {
        {
            let mut cache = self.cache.lock().await;
            if let Some(name) = cache.get(&tenant_id) {
                return name.clone();
            }
        }

        match self.directory.display_name(tenant_id).await {
            Ok(Some(name)) => {
                let mut cache = self.cache.lock().await;
                cache.put(tenant_id, name.clone());
                name
            }
            Ok(None) => {
                error!(
                    tenant_id = %tenant_id,
                    "tenant_names: tenant not found in directory, using placeholder path segment"
                );
                Self::placeholder(tenant_id)
            }
            Err(e) => {
                error!(
                    tenant_id = %tenant_id,
                    error = %e,
                    "tenant_names: directory lookup failed, using placeholder path segment"
                );
                Self::placeholder(tenant_id)
            }
        }
    }

    fn placeholder(tenant_id: Uuid) -> String {
        format!("tenant-{tenant_id}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use innboard_core::Result;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingDirectory {
        name: Option<String>,
        calls: AtomicUsize,
        fail: bool,
    }

    #[async_trait]
    impl TenantDirectory for CountingDirectory {
        async fn display_name(&self, _tenant_id: Uuid) -> Result<Option<String>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(innboard_core::Error::Internal("directory down".into()));
            }
            Ok(self.name.clone())
        }
    }

    #[tokio::test]
    async fn test_hit_avoids_second_lookup() {
        let dir = Arc::new(CountingDirectory {
            name: Some("Seaside Inn".to_string()),
            calls: AtomicUsize::new(0),
            fail: false,
        });
        let cache = TenantNameCache::new(dir.clone());
        let id = Uuid::new_v4();

        assert_eq!(cache.resolve(id).await, "Seaside Inn");
        assert_eq!(cache.resolve(id).await, "Seaside Inn");
        assert_eq!(dir.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_placeholder_on_unknown_and_not_cached() {
        let dir = Arc::new(CountingDirectory {
            name: None,
            calls: AtomicUsize::new(0),
            fail: false,
        });
        let cache = TenantNameCache::new(dir.clone());
        let id = Uuid::new_v4();

        assert_eq!(cache.resolve(id).await, format!("tenant-{id}"));
        cache.resolve(id).await;
        // Placeholders are re-looked-up every time
        assert_eq!(dir.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_placeholder_on_directory_error() {
        let dir = Arc::new(CountingDirectory {
            name: Some("never used".to_string()),
            calls: AtomicUsize::new(0),
            fail: true,
        });
        let cache = TenantNameCache::new(dir);
        let id = Uuid::new_v4();
        assert_eq!(cache.resolve(id).await, format!("tenant-{id}"));
    }
}
