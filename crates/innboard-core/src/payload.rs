//! Lenient parsing of request payloads whose shapes are not guaranteed.
//!
//! Callers send attachment references either at the top level of the
//! request, nested one level under a `document_metadata` wrapper, or not
//! at all. The wrapper may be present but explicitly `null` or empty; in
//! that case the outer object's own fields are the reference and must not
//! be discarded. This module implements that precedence as an explicit,
//! independently testable parser rather than ad-hoc null-coalescing at
//! call sites.
//!
//! Signature payloads use two key names interchangeably; they are treated
//! as synonyms checked in a fixed priority order.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde_json::Value;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::models::{AttachmentReference, AttachmentSlot};

/// Wrapper key under which callers may nest attachment metadata.
pub const DOCUMENT_METADATA_KEY: &str = "document_metadata";

/// Signature payload keys, checked in order; the first non-empty wins.
pub const SIGNATURE_KEYS: [&str; 2] = ["signature", "signature_image"];

/// Outcome of extracting one slot's reference from a payload.
#[derive(Debug, Clone, PartialEq)]
pub enum SlotExtraction {
    /// At least one reference field was found.
    Reference(AttachmentReference),
    /// Nothing usable in the payload; the resolver falls back to the
    /// database, and ultimately to skipping the slot.
    NotFound,
}

/// Extract an [`AttachmentReference`] for `slot` from a request payload.
///
/// Precedence, stopping at the first non-empty parse:
/// 1. Top-level field matching the slot name.
/// 2. The same field nested under [`DOCUMENT_METADATA_KEY`], if that
///    wrapper is a non-null object.
/// 3. If the wrapper key is present but null (or carried nothing for this
///    slot), the outer object's own fields. Flat fields describe exactly
///    one attachment, so they fill the primary slot only; handing the
///    same reference to every slot would merge it repeatedly.
pub fn extract_slot_reference(payload: &Value, slot: AttachmentSlot) -> SlotExtraction {
    let field = slot.payload_field();

    if let Some(v) = payload.get(field) {
        let parsed = parse_reference(v);
        if !parsed.is_empty() {
            return SlotExtraction::Reference(parsed);
        }
    }

    match payload.get(DOCUMENT_METADATA_KEY) {
        Some(Value::Object(wrapper)) => {
            if let Some(v) = wrapper.get(field) {
                let parsed = parse_reference(v);
                if !parsed.is_empty() {
                    return SlotExtraction::Reference(parsed);
                }
            }
            // Wrapper present but empty for this slot: the parent object's
            // own fields may still be the reference.
            own_fields_fallback(payload, slot)
        }
        // Present but null (or a non-object): fall through to the outer
        // object's own fields, never straight to NotFound.
        Some(_) => own_fields_fallback(payload, slot),
        None => SlotExtraction::NotFound,
    }
}

/// Last-resort parse of the outer object's flat fields. A flat payload
/// carries at most one attachment, attributed to the primary slot; every
/// other slot reports NotFound so the reference is not duplicated.
fn own_fields_fallback(payload: &Value, slot: AttachmentSlot) -> SlotExtraction {
    if slot != AttachmentSlot::Primary {
        return SlotExtraction::NotFound;
    }
    let parsed = parse_own_fields(payload);
    if parsed.is_empty() {
        SlotExtraction::NotFound
    } else {
        SlotExtraction::Reference(parsed)
    }
}

/// Parse a single payload value as an attachment reference.
///
/// A bare string is taken as a storage path; an object is probed with key
/// synonyms per field.
fn parse_reference(v: &Value) -> AttachmentReference {
    match v {
        Value::String(s) if !s.trim().is_empty() => AttachmentReference {
            storage_path: Some(s.clone()),
            ..Default::default()
        },
        Value::Object(_) => parse_own_fields(v),
        _ => AttachmentReference::default(),
    }
}

/// Probe an object's own fields for reference data, tolerating the key
/// synonyms observed in caller payloads.
fn parse_own_fields(v: &Value) -> AttachmentReference {
    AttachmentReference {
        id: first_str(v, &["id", "attachment_id"]).and_then(|s| Uuid::parse_str(s).ok()),
        storage_path: first_str(v, &["storage_path", "file_path", "path"]).map(str::to_string),
        bucket: first_str(v, &["bucket", "bucket_name"]).map(str::to_string),
        content_type: first_str(v, &["content_type", "mime_type"]).map(str::to_string),
    }
}

fn first_str<'a>(v: &'a Value, keys: &[&str]) -> Option<&'a str> {
    keys.iter()
        .filter_map(|k| v.get(k).and_then(Value::as_str))
        .find(|s| !s.trim().is_empty())
}

/// Extract and decode a signature image from a request payload.
///
/// Returns `None` when no signature was supplied (preview request),
/// `Some(Err(_))` when a signature was supplied but is not valid base64
/// (the caller degrades the artifact to preview), and `Some(Ok(bytes))`
/// with the decoded image bytes otherwise.
pub fn extract_signature_image(payload: &Value) -> Option<Result<Vec<u8>>> {
    let encoded = SIGNATURE_KEYS
        .iter()
        .filter_map(|k| payload.get(*k).and_then(Value::as_str))
        .find(|s| !s.trim().is_empty())?;

    Some(decode_signature(encoded))
}

/// Decode a transport-encoded signature string. Accepts a bare base64
/// payload or a `data:image/...;base64,` URI.
pub fn decode_signature(encoded: &str) -> Result<Vec<u8>> {
    let trimmed = encoded.trim();
    let b64 = match trimmed.strip_prefix("data:") {
        Some(rest) => rest
            .split_once(',')
            .map(|(_, data)| data)
            .ok_or_else(|| Error::SignatureDecode("malformed data URI".to_string()))?,
        None => trimmed,
    };

    let compact: String = b64.chars().filter(|c| !c.is_whitespace()).collect();
    BASE64
        .decode(compact.as_bytes())
        .map_err(|e| Error::SignatureDecode(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn primary(payload: &Value) -> SlotExtraction {
        extract_slot_reference(payload, AttachmentSlot::Primary)
    }

    #[test]
    fn test_top_level_slot_field_wins() {
        let payload = json!({
            "primary_attachment": {
                "id": "a5e3f3a4-27a4-4f29-b3a7-2e8b6c9d1e2f",
                "storage_path": "Seaside Inn/e1/uploads/check.jpg",
                "content_type": "image/jpeg"
            },
            "document_metadata": {
                "primary_attachment": { "storage_path": "should/not/win.jpg" }
            }
        });
        match primary(&payload) {
            SlotExtraction::Reference(r) => {
                assert_eq!(
                    r.storage_path.as_deref(),
                    Some("Seaside Inn/e1/uploads/check.jpg")
                );
                assert!(r.id.is_some());
            }
            other => panic!("expected reference, got {other:?}"),
        }
    }

    #[test]
    fn test_nested_under_wrapper() {
        let payload = json!({
            "document_metadata": {
                "primary_attachment": {
                    "storage_path": "Seaside Inn/e1/uploads/check.jpg",
                    "mime_type": "image/jpeg"
                }
            }
        });
        match primary(&payload) {
            SlotExtraction::Reference(r) => {
                assert!(r.has_storage_path());
                assert_eq!(r.content_type.as_deref(), Some("image/jpeg"));
            }
            other => panic!("expected reference, got {other:?}"),
        }
    }

    #[test]
    fn test_null_wrapper_falls_through_to_parent_fields() {
        // The wrapper key exists but is null; sibling fields at the parent
        // level must still resolve, never silently regress to NotFound.
        let payload = json!({
            "document_metadata": null,
            "attachment_id": "a5e3f3a4-27a4-4f29-b3a7-2e8b6c9d1e2f",
            "file_path": "Seaside Inn/e1/uploads/check.jpg",
            "bucket_name": "onboarding"
        });
        match primary(&payload) {
            SlotExtraction::Reference(r) => {
                assert!(r.id.is_some());
                assert_eq!(
                    r.storage_path.as_deref(),
                    Some("Seaside Inn/e1/uploads/check.jpg")
                );
                assert_eq!(r.bucket.as_deref(), Some("onboarding"));
            }
            other => panic!("expected reference, got {other:?}"),
        }
    }

    #[test]
    fn test_empty_wrapper_falls_through_to_parent_fields() {
        let payload = json!({
            "document_metadata": {},
            "storage_path": "Seaside Inn/e1/uploads/letter.pdf"
        });
        match primary(&payload) {
            SlotExtraction::Reference(r) => {
                assert_eq!(
                    r.storage_path.as_deref(),
                    Some("Seaside Inn/e1/uploads/letter.pdf")
                );
            }
            other => panic!("expected reference, got {other:?}"),
        }
    }

    #[test]
    fn test_flat_fallback_fills_primary_slot_only() {
        // One flat reference next to a null wrapper must land in exactly
        // one slot, not be mirrored into both.
        let payload = json!({
            "document_metadata": null,
            "file_path": "Seaside Inn/e1/uploads/check.jpg"
        });
        assert!(matches!(
            extract_slot_reference(&payload, AttachmentSlot::Primary),
            SlotExtraction::Reference(_)
        ));
        assert_eq!(
            extract_slot_reference(&payload, AttachmentSlot::Secondary),
            SlotExtraction::NotFound
        );

        // Same rule when the wrapper is an object lacking the slot key.
        let payload = json!({
            "document_metadata": {},
            "storage_path": "Seaside Inn/e1/uploads/letter.pdf"
        });
        assert_eq!(
            extract_slot_reference(&payload, AttachmentSlot::Secondary),
            SlotExtraction::NotFound
        );
    }

    #[test]
    fn test_absent_everywhere_is_not_found() {
        assert_eq!(primary(&json!({})), SlotExtraction::NotFound);
        assert_eq!(
            primary(&json!({ "form_data": { "bank_name": "First Coastal" } })),
            SlotExtraction::NotFound
        );
    }

    #[test]
    fn test_slots_are_independent() {
        let payload = json!({
            "primary_attachment": { "storage_path": "p.jpg" }
        });
        assert!(matches!(
            extract_slot_reference(&payload, AttachmentSlot::Primary),
            SlotExtraction::Reference(_)
        ));
        assert_eq!(
            extract_slot_reference(&payload, AttachmentSlot::Secondary),
            SlotExtraction::NotFound
        );
    }

    #[test]
    fn test_bare_string_is_a_storage_path() {
        let payload = json!({ "primary_attachment": "Seaside Inn/e1/uploads/check.jpg" });
        match primary(&payload) {
            SlotExtraction::Reference(r) => assert!(r.has_storage_path()),
            other => panic!("expected reference, got {other:?}"),
        }
    }

    #[test]
    fn test_id_only_reference_requires_db_fallback() {
        let payload = json!({
            "primary_attachment": { "id": "a5e3f3a4-27a4-4f29-b3a7-2e8b6c9d1e2f" }
        });
        match primary(&payload) {
            SlotExtraction::Reference(r) => {
                assert!(r.id.is_some());
                assert!(!r.has_storage_path());
            }
            other => panic!("expected reference, got {other:?}"),
        }
    }

    #[test]
    fn test_signature_key_priority_order() {
        let png = BASE64.encode(b"fake-png-bytes");
        let payload = json!({
            "signature_image": BASE64.encode(b"second-choice"),
            "signature": png,
        });
        let decoded = extract_signature_image(&payload).unwrap().unwrap();
        assert_eq!(decoded, b"fake-png-bytes");
    }

    #[test]
    fn test_signature_synonym_key() {
        let payload = json!({ "signature_image": BASE64.encode(b"img") });
        let decoded = extract_signature_image(&payload).unwrap().unwrap();
        assert_eq!(decoded, b"img");
    }

    #[test]
    fn test_empty_signature_string_skipped() {
        let payload = json!({ "signature": "  ", "signature_image": BASE64.encode(b"img") });
        let decoded = extract_signature_image(&payload).unwrap().unwrap();
        assert_eq!(decoded, b"img");
    }

    #[test]
    fn test_no_signature_is_none() {
        assert!(extract_signature_image(&json!({})).is_none());
    }

    #[test]
    fn test_data_uri_signature() {
        let encoded = format!("data:image/png;base64,{}", BASE64.encode(b"img"));
        assert_eq!(decode_signature(&encoded).unwrap(), b"img");
    }

    #[test]
    fn test_corrupt_signature_is_decode_error() {
        let payload = json!({ "signature": "%%%not-base64%%%" });
        let err = extract_signature_image(&payload).unwrap().unwrap_err();
        assert!(matches!(err, Error::SignatureDecode(_)));
    }
}
