//! Core data model for the innboard document subsystem.
//!
//! The durable types here mirror database rows one-to-one; the ephemeral
//! types (`FormArtifact`, `SignatureRecord`) live and die within a single
//! generate-and-sign request.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

// =============================================================================
// FORM KINDS
// =============================================================================

/// The compliance forms an employee works through during onboarding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FormKind {
    W4,
    I9,
    DirectDeposit,
    HumanTrafficking,
    WeaponsPolicy,
    PolicyAck,
}

impl FormKind {
    /// Canonical wire/storage-path name for this form kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            FormKind::W4 => "w4",
            FormKind::I9 => "i9",
            FormKind::DirectDeposit => "direct_deposit",
            FormKind::HumanTrafficking => "human_trafficking",
            FormKind::WeaponsPolicy => "weapons_policy",
            FormKind::PolicyAck => "policy_ack",
        }
    }

    /// Human-readable document title used by the renderer.
    pub fn title(&self) -> &'static str {
        match self {
            FormKind::W4 => "Employee's Withholding Certificate (W-4)",
            FormKind::I9 => "Employment Eligibility Verification (I-9)",
            FormKind::DirectDeposit => "Direct Deposit Authorization",
            FormKind::HumanTrafficking => "Human Trafficking Awareness Acknowledgment",
            FormKind::WeaponsPolicy => "Weapons-Free Workplace Policy Acknowledgment",
            FormKind::PolicyAck => "Company Policy Acknowledgment",
        }
    }

    /// The uploaded-attachment kind expected in a slot for this form,
    /// used for the (employee, kind) database fallback lookup.
    ///
    /// Returns `None` when the form has no use for that slot.
    pub fn slot_attachment_kind(&self, slot: AttachmentSlot) -> Option<&'static str> {
        match (self, slot) {
            (FormKind::DirectDeposit, AttachmentSlot::Primary) => Some("voided_check"),
            (FormKind::DirectDeposit, AttachmentSlot::Secondary) => Some("bank_letter"),
            (FormKind::I9, AttachmentSlot::Primary) => Some("identity_document"),
            (FormKind::I9, AttachmentSlot::Secondary) => Some("work_authorization"),
            _ => None,
        }
    }
}

impl fmt::Display for FormKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FormKind {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "w4" | "w-4" => Ok(FormKind::W4),
            "i9" | "i-9" => Ok(FormKind::I9),
            "direct_deposit" => Ok(FormKind::DirectDeposit),
            "human_trafficking" => Ok(FormKind::HumanTrafficking),
            "weapons_policy" => Ok(FormKind::WeaponsPolicy),
            "policy_ack" => Ok(FormKind::PolicyAck),
            other => Err(crate::Error::InvalidInput(format!(
                "Unknown form type: {other}"
            ))),
        }
    }
}

// =============================================================================
// ATTACHMENT SLOTS
// =============================================================================

/// A named attachment position within a form's merge order.
///
/// Merge order is fixed: base form pages, then primary, then secondary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttachmentSlot {
    Primary,
    Secondary,
}

impl AttachmentSlot {
    /// Both slots in merge order.
    pub const ALL: [AttachmentSlot; 2] = [AttachmentSlot::Primary, AttachmentSlot::Secondary];

    pub fn as_str(&self) -> &'static str {
        match self {
            AttachmentSlot::Primary => "primary",
            AttachmentSlot::Secondary => "secondary",
        }
    }

    /// Request payload field name carrying this slot's reference.
    pub fn payload_field(&self) -> &'static str {
        match self {
            AttachmentSlot::Primary => "primary_attachment",
            AttachmentSlot::Secondary => "secondary_attachment",
        }
    }
}

impl fmt::Display for AttachmentSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// ATTACHMENTS
// =============================================================================

/// Logical pointer to a previously uploaded file, as parsed from a request
/// payload. Every field is optional because payload shapes are not
/// guaranteed; the resolver fills gaps via database fallback.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AttachmentReference {
    pub id: Option<Uuid>,
    pub storage_path: Option<String>,
    pub bucket: Option<String>,
    pub content_type: Option<String>,
}

impl AttachmentReference {
    /// Whether any reference field was populated at all.
    pub fn is_empty(&self) -> bool {
        self.id.is_none()
            && self.storage_path.is_none()
            && self.bucket.is_none()
            && self.content_type.is_none()
    }

    /// Whether the reference can be fetched without a database lookup.
    pub fn has_storage_path(&self) -> bool {
        self.storage_path.as_deref().is_some_and(|p| !p.is_empty())
    }
}

/// Fully resolved attachment: storage path is known, fetchable as-is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedAttachment {
    pub slot: AttachmentSlot,
    pub id: Option<Uuid>,
    pub storage_path: String,
    pub bucket: Option<String>,
    pub content_type: Option<String>,
}

/// Row in `uploaded_attachment`, written by the external upload subsystem
/// and read-only inside this subsystem.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadedAttachment {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub employee_id: Uuid,
    /// Attachment kind, e.g. "voided_check", "bank_letter".
    pub kind: String,
    pub storage_path: String,
    pub bucket: String,
    pub content_type: String,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// SIGNATURES
// =============================================================================

/// Where on the document a signature is stamped.
///
/// Coordinates are PDF points from the page's bottom-left corner; `page`
/// is 1-based. The defaults target the acknowledgment block every
/// rendered form reserves near the bottom of its first page.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SignaturePlacement {
    pub page: u32,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Default for SignaturePlacement {
    fn default() -> Self {
        Self {
            page: crate::defaults::SIGNATURE_PAGE,
            x: crate::defaults::SIGNATURE_X_PT,
            y: crate::defaults::SIGNATURE_Y_PT,
            width: crate::defaults::SIGNATURE_WIDTH_PT,
            height: crate::defaults::SIGNATURE_HEIGHT_PT,
        }
    }
}

/// A signer's captured signature, consumed once by the embedder.
///
/// The image bytes arrive transport-encoded (base64, possibly wrapped in a
/// data URI) and are decoded before this struct is built.
#[derive(Debug, Clone)]
pub struct SignatureRecord {
    /// Decoded signature image bytes (PNG or JPEG).
    pub image: Vec<u8>,
    /// Where the image is stamped on the rendered form.
    pub placement: SignaturePlacement,
    pub signed_at: DateTime<Utc>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

// =============================================================================
// ARTIFACTS
// =============================================================================

/// Ephemeral result of rendering one form: born and discarded within a
/// single request unless it transitions into a persisted document.
#[derive(Debug, Clone)]
pub struct FormArtifact {
    pub bytes: Vec<u8>,
    pub page_count: usize,
    /// True when no usable signature was burned in. Preview artifacts must
    /// never reach the storage gateway.
    pub is_preview: bool,
    pub employee_id: Uuid,
    pub form: FormKind,
}

// =============================================================================
// PERSISTED DOCUMENTS
// =============================================================================

/// Row in the append-only `signed_document` log. A new signing event
/// always inserts a new row; the most recent row per (employee, form_type)
/// is the "active" document, older rows are inert audit history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistedDocument {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub employee_id: Uuid,
    pub form_type: String,
    pub storage_path: String,
    pub bucket: String,
    /// Optional long-lived grant URL recorded at sign time, used only
    /// when grant recomputation fails during rehydration.
    pub static_url: Option<String>,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

impl PersistedDocument {
    /// Filename component of the storage path.
    pub fn filename(&self) -> &str {
        self.storage_path
            .rsplit('/')
            .next()
            .unwrap_or(&self.storage_path)
    }
}

/// Insert request for a new `signed_document` row.
#[derive(Debug, Clone)]
pub struct RecordSignedDocumentRequest {
    pub tenant_id: Uuid,
    pub employee_id: Uuid,
    pub form_type: String,
    pub storage_path: String,
    pub bucket: String,
    pub static_url: Option<String>,
}

// =============================================================================
// SIGNED URL GRANTS
// =============================================================================

/// Time-limited retrieval link for a persisted artifact. Never stored;
/// recomputed on every read.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignedUrlGrant {
    pub url: String,
    pub expires_at: DateTime<Utc>,
}
