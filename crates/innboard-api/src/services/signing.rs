//! The generate-and-sign pipeline.
//!
//! One request flows through five stages: render the form from payload
//! data, burn in the signature (or degrade to a preview), resolve and
//! fetch attachments, merge everything into one document, and persist the
//! signed result. Rendering, signature embedding, and merging are
//! CPU-bound lopdf work and run on the blocking pool.
//!
//! Failure policy is deliberately asymmetric:
//! - Missing required form fields fail the request (caller error).
//! - A bad signature degrades the artifact to a preview.
//! - A missing, slow, or unreadable attachment is skipped and reported
//!   via `all_attachments_merged`.
//! - A persistence failure after signing still returns the signed bytes;
//!   losing the caller's copy helps nobody.

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tokio::time::timeout;
use tracing::{error, info, warn};
use uuid::Uuid;

use chrono::Utc;

use innboard_core::defaults::{
    ATTACHMENT_FETCH_TIMEOUT_SECS, STATIC_URL_TTL_SECS, UPLOAD_TIMEOUT_SECS,
};
use innboard_core::{
    extract_signature_image, Error, FormArtifact, FormKind, RecordSignedDocumentRequest,
    ResolvedAttachment, Result, SignatureRecord, SignedDocumentRepository, SignedUrlGrant,
};
use innboard_db::{document_storage_path, StorageBackend, UrlSigner};
use innboard_pdf::{
    embed_signature, merge_documents, normalize_attachment, page_count, render_form, to_bytes,
    Document, PdfError, SignaturePlacement,
};

use super::resolver::MetadataResolver;
use super::tenant_names::TenantNameCache;

/// One generate-and-sign request, after the handler has parsed the
/// envelope fields. `payload` is the raw request body; the signature and
/// attachment references are extracted from it leniently.
#[derive(Debug, Clone)]
pub struct GenerateRequest {
    pub tenant_id: Uuid,
    pub employee_id: Uuid,
    pub form: FormKind,
    pub payload: Value,
    /// Signer provenance captured from the transport layer, recorded in
    /// the audit log line when a signature is burned in.
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

/// What one pipeline run produced.
#[derive(Debug)]
pub struct GenerateOutcome {
    pub artifact: FormArtifact,
    /// True when the artifact was uploaded and logged. Always false for
    /// previews; can be false for signed artifacts if persistence failed.
    pub persisted: bool,
    pub storage_path: Option<String>,
    pub grant: Option<SignedUrlGrant>,
    /// False when any requested or fetched attachment did not make it
    /// into the final document.
    pub all_attachments_merged: bool,
}

pub struct SigningService {
    documents: Arc<dyn SignedDocumentRepository>,
    resolver: MetadataResolver,
    tenants: TenantNameCache,
    storage: Arc<dyn StorageBackend>,
    signer: UrlSigner,
    bucket: String,
}

impl SigningService {
    pub fn new(
        documents: Arc<dyn SignedDocumentRepository>,
        resolver: MetadataResolver,
        tenants: TenantNameCache,
        storage: Arc<dyn StorageBackend>,
        signer: UrlSigner,
        bucket: impl Into<String>,
    ) -> Self {
        Self {
            documents,
            resolver,
            tenants,
            storage,
            signer,
            bucket: bucket.into(),
        }
    }

    /// Run the full pipeline for one request.
    pub async fn generate(&self, req: GenerateRequest) -> Result<GenerateOutcome> {
        let started = std::time::Instant::now();
        let form = req.form;
        let employee_id = req.employee_id;

        let form_data = req
            .payload
            .get("form_data")
            .cloned()
            .unwrap_or_else(|| req.payload.clone());

        // A payload that carries a signature key with undecodable content
        // degrades to a preview; the caller finds out via is_preview.
        let signature = match extract_signature_image(&req.payload) {
            None => None,
            Some(Ok(image)) => Some(SignatureRecord {
                image,
                placement: SignaturePlacement::default(),
                signed_at: Utc::now(),
                ip_address: req.ip_address.clone(),
                user_agent: req.user_agent.clone(),
            }),
            Some(Err(e)) => {
                warn!(
                    employee_id = %employee_id,
                    form_type = %form,
                    error = %e,
                    "signing: signature payload undecodable, degrading to preview"
                );
                None
            }
        };

        // Stage 1: render + embed (blocking pool, lopdf is CPU-bound).
        let (doc, signed) = {
            let sig = signature;
            tokio::task::spawn_blocking(move || render_and_sign(form, &form_data, sig))
                .await
                .map_err(|e| Error::Internal(format!("render task failed: {e}")))??
        };

        // Stage 2: resolve slot references and fetch attachment bytes.
        let mut all_merged = true;
        let mut fetched: Vec<(ResolvedAttachment, Vec<u8>)> = Vec::new();
        for resolution in self
            .resolver
            .resolve_all(&req.payload, employee_id, form)
            .await
        {
            let Some(att) = resolution.attachment else {
                if resolution.requested {
                    warn!(
                        employee_id = %employee_id,
                        form_type = %form,
                        slot = %resolution.slot,
                        "signing: requested attachment could not be resolved"
                    );
                    all_merged = false;
                }
                continue;
            };

            let fetch = self.storage.read(&att.storage_path);
            match timeout(Duration::from_secs(ATTACHMENT_FETCH_TIMEOUT_SECS), fetch).await {
                Ok(Ok(bytes)) => fetched.push((att, bytes)),
                Ok(Err(e)) => {
                    warn!(
                        employee_id = %employee_id,
                        slot = %att.slot,
                        storage_path = %att.storage_path,
                        error = %e,
                        "signing: attachment fetch failed, skipping slot"
                    );
                    all_merged = false;
                }
                Err(_) => {
                    warn!(
                        employee_id = %employee_id,
                        slot = %att.slot,
                        storage_path = %att.storage_path,
                        timeout_secs = ATTACHMENT_FETCH_TIMEOUT_SECS,
                        "signing: attachment fetch timed out, skipping slot"
                    );
                    all_merged = false;
                }
            }
        }

        // Stage 3: normalize + merge (blocking pool again).
        let (bytes, pages, skipped) =
            tokio::task::spawn_blocking(move || normalize_and_merge(doc, fetched))
                .await
                .map_err(|e| Error::Internal(format!("merge task failed: {e}")))??;
        if skipped > 0 {
            all_merged = false;
        }

        let artifact = FormArtifact {
            bytes,
            page_count: pages,
            is_preview: !signed,
            employee_id,
            form,
        };

        // Stage 4: persist, signed artifacts only. Persistence failure is
        // reported, not propagated: the signed bytes still go back.
        let mut persisted = false;
        let mut storage_path = None;
        let mut grant = None;
        if signed {
            match self.persist(&artifact, req.tenant_id).await {
                Ok((path, g)) => {
                    persisted = true;
                    storage_path = Some(path);
                    grant = Some(g);
                }
                Err(e) => {
                    error!(
                        employee_id = %employee_id,
                        form_type = %form,
                        error = %e,
                        "signing: signed document could not be persisted, returning artifact anyway"
                    );
                }
            }
        }

        info!(
            employee_id = %employee_id,
            form_type = %form,
            signed,
            persisted,
            page_count = artifact.page_count,
            byte_len = artifact.bytes.len(),
            all_attachments_merged = all_merged,
            duration_ms = started.elapsed().as_millis() as u64,
            "signing: pipeline complete"
        );

        Ok(GenerateOutcome {
            artifact,
            persisted,
            storage_path,
            grant,
            all_attachments_merged: all_merged,
        })
    }

    /// Upload the artifact, record the signing event, issue a grant.
    ///
    /// Rejects preview artifacts: nothing unsigned may reach storage.
    async fn persist(
        &self,
        artifact: &FormArtifact,
        tenant_id: Uuid,
    ) -> Result<(String, SignedUrlGrant)> {
        if artifact.is_preview {
            return Err(Error::Internal(
                "preview artifact must not be persisted".to_string(),
            ));
        }

        let tenant_name = self.tenants.resolve(tenant_id).await;
        let path =
            document_storage_path(&tenant_name, artifact.employee_id, artifact.form.as_str());

        let upload = self.storage.write(&path, &artifact.bytes);
        timeout(Duration::from_secs(UPLOAD_TIMEOUT_SECS), upload)
            .await
            .map_err(|_| {
                Error::Timeout(format!(
                    "artifact upload exceeded {UPLOAD_TIMEOUT_SECS}s"
                ))
            })??;

        // The stored fallback URL must itself pass grant verification on
        // the files endpoint, so it is a grant too, just a long-lived one.
        let fallback = self
            .signer
            .issue_with_ttl(&path, chrono::Duration::seconds(STATIC_URL_TTL_SECS))?;

        self.documents
            .insert(RecordSignedDocumentRequest {
                tenant_id,
                employee_id: artifact.employee_id,
                form_type: artifact.form.as_str().to_string(),
                storage_path: path.clone(),
                bucket: self.bucket.clone(),
                static_url: Some(fallback.url),
            })
            .await?;

        let grant = self.signer.issue(&path)?;
        Ok((path, grant))
    }
}

/// Blocking stage 1: render the form, then embed the signature if one
/// survived decoding. An image-level decode failure here also degrades to
/// preview rather than failing the request.
fn render_and_sign(
    form: FormKind,
    form_data: &Value,
    signature: Option<SignatureRecord>,
) -> std::result::Result<(Document, bool), PdfError> {
    let rendered = render_form(form, form_data)?;
    let mut doc = rendered.doc;

    let mut signed = false;
    if let Some(record) = signature {
        match embed_signature(&mut doc, &record.image, record.placement) {
            Ok(()) => {
                signed = true;
                info!(
                    form_type = %form,
                    signed_at = %record.signed_at,
                    ip_address = record.ip_address.as_deref().unwrap_or("-"),
                    user_agent = record.user_agent.as_deref().unwrap_or("-"),
                    "signing: signature embedded"
                );
            }
            Err(PdfError::SignatureDecode(msg)) => {
                warn!(
                    form_type = %form,
                    error = %msg,
                    "signing: signature image undecodable, degrading to preview"
                );
            }
            Err(e) => return Err(e),
        }
    }

    Ok((doc, signed))
}

/// Blocking stage 3: normalize fetched attachments into page documents
/// and append them to the base in slot order. Returns the serialized
/// artifact, its page count, and how many attachments were skipped.
fn normalize_and_merge(
    base: Document,
    fetched: Vec<(ResolvedAttachment, Vec<u8>)>,
) -> std::result::Result<(Vec<u8>, usize, usize), PdfError> {
    let mut attachment_docs = Vec::new();
    let mut skipped = 0;

    for (att, bytes) in fetched {
        match normalize_attachment(&bytes, att.content_type.as_deref()) {
            Ok(Some(doc)) => attachment_docs.push(doc),
            Ok(None) => {
                warn!(
                    slot = %att.slot,
                    storage_path = %att.storage_path,
                    "signing: unsupported attachment type, skipping"
                );
                skipped += 1;
            }
            Err(e) => {
                warn!(
                    slot = %att.slot,
                    storage_path = %att.storage_path,
                    error = %e,
                    "signing: attachment could not be normalized, skipping"
                );
                skipped += 1;
            }
        }
    }

    let mut merged = if attachment_docs.is_empty() {
        base
    } else {
        let mut all = Vec::with_capacity(1 + attachment_docs.len());
        all.push(base);
        all.extend(attachment_docs);
        merge_documents(all)?
    };

    let pages = page_count(&merged);
    let bytes = to_bytes(&mut merged)?;
    Ok((bytes, pages, skipped))
}
