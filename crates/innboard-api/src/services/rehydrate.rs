//! Rehydration: what does this employee's latest signed copy look like?
//!
//! Reads never hand out stored URLs. The current document is looked up in
//! the append-only log, its existence in storage is confirmed, and a
//! fresh grant is issued. The long-lived grant URL recorded at sign time
//! is a last-resort fallback only.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{error, warn};
use uuid::Uuid;

use innboard_core::{FormKind, Result, SignedDocumentRepository};
use innboard_db::{StorageBackend, UrlSigner};

/// Result of a rehydration lookup.
#[derive(Debug, Clone)]
pub struct RehydrationOutcome {
    pub has_document: bool,
    pub signed_url: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
    pub filename: Option<String>,
    pub signed_at: Option<DateTime<Utc>>,
}

impl RehydrationOutcome {
    fn none() -> Self {
        Self {
            has_document: false,
            signed_url: None,
            expires_at: None,
            filename: None,
            signed_at: None,
        }
    }
}

pub struct RehydrationService {
    documents: Arc<dyn SignedDocumentRepository>,
    storage: Arc<dyn StorageBackend>,
    signer: UrlSigner,
}

impl RehydrationService {
    pub fn new(
        documents: Arc<dyn SignedDocumentRepository>,
        storage: Arc<dyn StorageBackend>,
        signer: UrlSigner,
    ) -> Self {
        Self {
            documents,
            storage,
            signer,
        }
    }

    /// Fetch the current signed document for (employee, form), if any,
    /// with a freshly issued retrieval grant.
    pub async fn rehydrate(&self, employee_id: Uuid, form: FormKind) -> Result<RehydrationOutcome> {
        let Some(doc) = self.documents.latest(employee_id, form.as_str()).await? else {
            return Ok(RehydrationOutcome::none());
        };

        let mut outcome = RehydrationOutcome {
            has_document: true,
            signed_url: None,
            expires_at: None,
            filename: Some(doc.filename().to_string()),
            signed_at: Some(doc.created_at),
        };

        // Existence check failures are treated as "missing": better to
        // fall back than to hand out a grant for an object that is gone.
        let exists = match self.storage.exists(&doc.storage_path).await {
            Ok(v) => v,
            Err(e) => {
                warn!(
                    employee_id = %employee_id,
                    form_type = %form,
                    storage_path = %doc.storage_path,
                    error = %e,
                    "rehydrate: storage existence check failed"
                );
                false
            }
        };

        if exists {
            match self.signer.issue(&doc.storage_path) {
                Ok(grant) => {
                    outcome.signed_url = Some(grant.url);
                    outcome.expires_at = Some(grant.expires_at);
                    return Ok(outcome);
                }
                Err(e) => {
                    warn!(
                        storage_path = %doc.storage_path,
                        error = %e,
                        "rehydrate: grant issuance failed, falling back to static URL"
                    );
                }
            }
        }

        match doc.static_url {
            Some(url) => outcome.signed_url = Some(url),
            None => {
                error!(
                    employee_id = %employee_id,
                    form_type = %form,
                    storage_path = %doc.storage_path,
                    "rehydrate: document row exists but no retrievable URL is available"
                );
            }
        }

        Ok(outcome)
    }
}
