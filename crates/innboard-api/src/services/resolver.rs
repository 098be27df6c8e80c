//! Attachment metadata resolution.
//!
//! Turns whatever the caller sent (a full reference, a bare id, or
//! nothing at all) into fetchable [`ResolvedAttachment`]s. Resolution is
//! best-effort by design: a slot that cannot be resolved is skipped, not
//! fatal, because a signed document without its voided check is still
//! worth more than a 500.

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tokio::time::timeout;
use tracing::{debug, warn};
use uuid::Uuid;

use innboard_core::defaults::METADATA_LOOKUP_TIMEOUT_SECS;
use innboard_core::{
    extract_slot_reference, AttachmentReference, AttachmentSlot, FormKind, ResolvedAttachment,
    SlotExtraction, UploadRepository,
};

/// Per-slot resolution result, carrying whether the caller explicitly
/// asked for this slot. Explicit requests that resolve to nothing flip
/// the response's `all_attachments_merged` flag.
#[derive(Debug, Clone)]
pub struct SlotResolution {
    pub slot: AttachmentSlot,
    /// True when the request payload carried a reference for this slot.
    pub requested: bool,
    pub attachment: Option<ResolvedAttachment>,
}

/// Resolves payload attachment references against the upload log.
pub struct MetadataResolver {
    uploads: Arc<dyn UploadRepository>,
}

impl MetadataResolver {
    pub fn new(uploads: Arc<dyn UploadRepository>) -> Self {
        Self { uploads }
    }

    /// Resolve every slot for a form, in merge order.
    pub async fn resolve_all(
        &self,
        payload: &Value,
        employee_id: Uuid,
        form: FormKind,
    ) -> Vec<SlotResolution> {
        let mut out = Vec::with_capacity(AttachmentSlot::ALL.len());
        for slot in AttachmentSlot::ALL {
            out.push(self.resolve_slot(payload, employee_id, form, slot).await);
        }
        out
    }

    /// Resolve one slot through the fallback chain:
    ///
    /// 1. A payload reference with a storage path is used as-is.
    /// 2. A payload reference with only an id is looked up in the upload
    ///    log.
    /// 3. With no usable reference, the most recent upload of the form's
    ///    expected kind for this employee fills the slot.
    ///
    /// Repository errors and stalled lookups are logged and treated as
    /// "not found"; they must not fail the signing request.
    pub async fn resolve_slot(
        &self,
        payload: &Value,
        employee_id: Uuid,
        form: FormKind,
        slot: AttachmentSlot,
    ) -> SlotResolution {
        let (requested, reference) = match extract_slot_reference(payload, slot) {
            SlotExtraction::Reference(r) => (true, Some(r)),
            SlotExtraction::NotFound => (false, None),
        };

        if let Some(reference) = reference {
            if reference.has_storage_path() {
                return SlotResolution {
                    slot,
                    requested,
                    attachment: Some(from_reference(slot, reference)),
                };
            }

            if let Some(id) = reference.id {
                let lookup = timeout(
                    Duration::from_secs(METADATA_LOOKUP_TIMEOUT_SECS),
                    self.uploads.get(id),
                );
                match lookup.await {
                    Ok(Ok(Some(upload))) => {
                        return SlotResolution {
                            slot,
                            requested,
                            attachment: Some(ResolvedAttachment {
                                slot,
                                id: Some(upload.id),
                                storage_path: upload.storage_path,
                                bucket: Some(upload.bucket),
                                content_type: Some(upload.content_type),
                            }),
                        };
                    }
                    Ok(Ok(None)) => {
                        warn!(
                            attachment_id = %id,
                            slot = %slot,
                            "resolver: referenced upload not found, trying kind fallback"
                        );
                    }
                    Ok(Err(e)) => {
                        warn!(
                            attachment_id = %id,
                            slot = %slot,
                            error = %e,
                            "resolver: upload lookup failed, trying kind fallback"
                        );
                    }
                    Err(_) => {
                        warn!(
                            attachment_id = %id,
                            slot = %slot,
                            timeout_secs = METADATA_LOOKUP_TIMEOUT_SECS,
                            "resolver: upload lookup timed out, trying kind fallback"
                        );
                    }
                }
            }
        }

        let attachment = self.kind_fallback(employee_id, form, slot).await;
        SlotResolution {
            slot,
            requested,
            attachment,
        }
    }

    async fn kind_fallback(
        &self,
        employee_id: Uuid,
        form: FormKind,
        slot: AttachmentSlot,
    ) -> Option<ResolvedAttachment> {
        let kind = form.slot_attachment_kind(slot)?;

        let lookup = timeout(
            Duration::from_secs(METADATA_LOOKUP_TIMEOUT_SECS),
            self.uploads.latest_for_kind(employee_id, kind),
        );
        match lookup.await {
            Ok(Ok(Some(upload))) => {
                debug!(
                    employee_id = %employee_id,
                    slot = %slot,
                    kind = %kind,
                    attachment_id = %upload.id,
                    "resolver: slot filled from upload log by kind"
                );
                Some(ResolvedAttachment {
                    slot,
                    id: Some(upload.id),
                    storage_path: upload.storage_path,
                    bucket: Some(upload.bucket),
                    content_type: Some(upload.content_type),
                })
            }
            Ok(Ok(None)) => None,
            Ok(Err(e)) => {
                warn!(
                    employee_id = %employee_id,
                    slot = %slot,
                    kind = %kind,
                    error = %e,
                    "resolver: kind fallback lookup failed, skipping slot"
                );
                None
            }
            Err(_) => {
                warn!(
                    employee_id = %employee_id,
                    slot = %slot,
                    kind = %kind,
                    timeout_secs = METADATA_LOOKUP_TIMEOUT_SECS,
                    "resolver: kind fallback lookup timed out, skipping slot"
                );
                None
            }
        }
    }
}

fn from_reference(slot: AttachmentSlot, r: AttachmentReference) -> ResolvedAttachment {
    ResolvedAttachment {
        slot,
        id: r.id,
        // has_storage_path() was checked by the caller
        storage_path: r.storage_path.unwrap_or_default(),
        bucket: r.bucket,
        content_type: r.content_type,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use innboard_core::{Result, UploadedAttachment};
    use serde_json::json;

    /// Upload repository whose lookups never complete, standing in for a
    /// hung database connection.
    struct StalledUploads;

    #[async_trait]
    impl UploadRepository for StalledUploads {
        async fn get(&self, _id: Uuid) -> Result<Option<UploadedAttachment>> {
            std::future::pending::<()>().await;
            unreachable!()
        }

        async fn latest_for_kind(
            &self,
            _employee_id: Uuid,
            _kind: &str,
        ) -> Result<Option<UploadedAttachment>> {
            std::future::pending::<()>().await;
            unreachable!()
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_stalled_id_lookup_skips_slot() {
        let resolver = MetadataResolver::new(Arc::new(StalledUploads));
        let payload = json!({
            "primary_attachment": { "id": "a5e3f3a4-27a4-4f29-b3a7-2e8b6c9d1e2f" }
        });

        let resolution = resolver
            .resolve_slot(
                &payload,
                Uuid::new_v4(),
                FormKind::W4,
                AttachmentSlot::Primary,
            )
            .await;

        assert!(resolution.requested);
        assert!(resolution.attachment.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_stalled_kind_fallback_skips_slot() {
        let resolver = MetadataResolver::new(Arc::new(StalledUploads));

        let resolution = resolver
            .resolve_slot(
                &json!({}),
                Uuid::new_v4(),
                FormKind::DirectDeposit,
                AttachmentSlot::Primary,
            )
            .await;

        assert!(!resolution.requested);
        assert!(resolution.attachment.is_none());
    }
}
