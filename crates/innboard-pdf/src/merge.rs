//! Attachment normalization and page merge.
//!
//! Heterogeneous attachment formats are isolated behind a single
//! normalization step that always yields "a document of pages to append",
//! so the merge-order invariant (base pages, then primary, then secondary)
//! is enforced in one place. Raster images become a single full-page
//! document; PDFs pass their pages through in original order; anything
//! else is reported as unsupported and skipped by the caller.

use lopdf::{dictionary, Document, Object, ObjectId, Stream};

use innboard_core::defaults::{PAGE_HEIGHT_PT, PAGE_MARGIN_PT, PAGE_WIDTH_PT};

use crate::error::{PdfError, Result};
use crate::images::{add_rgba_xobject, append_draw_ops, fit_dimensions, register_page_xobject};

/// Resource name attachment image XObjects are registered under.
const ATTACHMENT_XOBJECT_NAME: &str = "AttImg";

/// How attachment bytes will be turned into pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttachmentClass {
    Pdf,
    Image,
    Unsupported,
}

/// Classify attachment bytes, preferring magic-byte sniffing over the
/// declared content type (caller metadata is not trusted to be accurate).
pub fn classify(bytes: &[u8], declared_type: Option<&str>) -> AttachmentClass {
    if let Some(kind) = infer::get(bytes) {
        let mime = kind.mime_type();
        if mime == "application/pdf" {
            return AttachmentClass::Pdf;
        }
        if mime.starts_with("image/") {
            return AttachmentClass::Image;
        }
    }
    match declared_type {
        Some("application/pdf") => AttachmentClass::Pdf,
        Some(m) if m.starts_with("image/") => AttachmentClass::Image,
        _ => AttachmentClass::Unsupported,
    }
}

/// Normalize attachment bytes into a document of pages to append.
///
/// Returns `Ok(None)` for unsupported formats (the caller skips the
/// attachment with a warning); parse/convert failures are errors, which
/// the caller also absorbs per-attachment.
pub fn normalize_attachment(
    bytes: &[u8],
    declared_type: Option<&str>,
) -> Result<Option<Document>> {
    match classify(bytes, declared_type) {
        AttachmentClass::Pdf => {
            let doc = Document::load_mem(bytes)
                .map_err(|e| PdfError::AttachmentConvert(format!("pdf parse: {e}")))?;
            Ok(Some(doc))
        }
        AttachmentClass::Image => {
            let img = image::load_from_memory(bytes)
                .map_err(|e| PdfError::AttachmentConvert(format!("image decode: {e}")))?
                .to_rgba8();
            image_page_document(&img).map(Some)
        }
        AttachmentClass::Unsupported => Ok(None),
    }
}

/// Wrap a raster image as a single-page document, scaled to fit within
/// the page margins and centered.
fn image_page_document(img: &image::RgbaImage) -> Result<Document> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let content_id = doc.add_object(Stream::new(dictionary! {}, Vec::new()));
    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => Object::Reference(pages_id),
        "Contents" => Object::Reference(content_id),
        "Resources" => Object::Dictionary(dictionary! {}),
        "MediaBox" => vec![
            0.into(),
            0.into(),
            PAGE_WIDTH_PT.into(),
            PAGE_HEIGHT_PT.into(),
        ],
    });
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => vec![Object::Reference(page_id)],
            "Count" => 1,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => Object::Reference(pages_id),
    });
    doc.trailer.set("Root", catalog_id);

    let embedded = add_rgba_xobject(&mut doc, img)?;
    register_page_xobject(&mut doc, page_id, ATTACHMENT_XOBJECT_NAME, embedded.xobject_id)?;

    let max_w = PAGE_WIDTH_PT - 2.0 * PAGE_MARGIN_PT;
    let max_h = PAGE_HEIGHT_PT - 2.0 * PAGE_MARGIN_PT;
    let (draw_w, draw_h) = fit_dimensions(embedded.width, embedded.height, max_w, max_h);
    let x = (PAGE_WIDTH_PT - draw_w) / 2.0;
    let y = (PAGE_HEIGHT_PT - draw_h) / 2.0;
    append_draw_ops(&mut doc, page_id, ATTACHMENT_XOBJECT_NAME, x, y, draw_w, draw_h)?;

    Ok(doc)
}

/// Merge documents into one, preserving input order exactly: all pages of
/// the first document, then all pages of the second, and so on.
pub fn merge_documents(documents: Vec<Document>) -> Result<Document> {
    if documents.is_empty() {
        return Err(PdfError::Structure("no documents to merge".to_string()));
    }

    let mut max_id = 1;
    // Pages kept as an ordered list: object-id ordering is not guaranteed
    // to match page ordering inside a source document.
    let mut page_entries: Vec<(ObjectId, Object)> = Vec::new();
    let mut documents_objects = std::collections::BTreeMap::new();
    let mut document = Document::with_version("1.5");

    for mut doc in documents {
        doc.renumber_objects_with(max_id);
        max_id = doc.max_id + 1;

        for (_page_number, object_id) in doc.get_pages() {
            page_entries.push((object_id, doc.get_object(object_id)?.to_owned()));
        }
        documents_objects.extend(doc.objects);
    }

    // "Catalog" and "Pages" are mandatory
    let mut catalog_object: Option<(ObjectId, Object)> = None;
    let mut pages_object: Option<(ObjectId, Object)> = None;

    for (object_id, object) in documents_objects.iter() {
        match object.type_name().unwrap_or("") {
            "Catalog" => {
                catalog_object = Some((
                    if let Some((id, _)) = catalog_object {
                        id
                    } else {
                        *object_id
                    },
                    object.clone(),
                ));
            }
            "Pages" => {
                if let Ok(dictionary) = object.as_dict() {
                    let mut dictionary = dictionary.clone();
                    if let Some((_, ref object)) = pages_object {
                        if let Ok(old_dictionary) = object.as_dict() {
                            dictionary.extend(old_dictionary);
                        }
                    }
                    pages_object = Some((
                        if let Some((id, _)) = pages_object {
                            id
                        } else {
                            *object_id
                        },
                        Object::Dictionary(dictionary),
                    ));
                }
            }
            "Page" => {}     // Re-parented below
            "Outlines" => {} // Dropped
            "Outline" => {}  // Dropped
            _ => {
                document.objects.insert(*object_id, object.clone());
            }
        }
    }

    let (pages_root_id, pages_root) =
        pages_object.ok_or_else(|| PdfError::Structure("Pages root not found".to_string()))?;
    let (catalog_id, catalog) =
        catalog_object.ok_or_else(|| PdfError::Structure("Catalog root not found".to_string()))?;

    for (object_id, object) in page_entries.iter() {
        if let Ok(dictionary) = object.as_dict() {
            let mut dictionary = dictionary.clone();
            dictionary.set("Parent", pages_root_id);
            document
                .objects
                .insert(*object_id, Object::Dictionary(dictionary));
        }
    }

    if let Ok(dictionary) = pages_root.as_dict() {
        let mut dictionary = dictionary.clone();
        dictionary.set("Count", page_entries.len() as u32);
        dictionary.set(
            "Kids",
            page_entries
                .iter()
                .map(|(object_id, _)| Object::Reference(*object_id))
                .collect::<Vec<_>>(),
        );
        document
            .objects
            .insert(pages_root_id, Object::Dictionary(dictionary));
    }

    if let Ok(dictionary) = catalog.as_dict() {
        let mut dictionary = dictionary.clone();
        dictionary.set("Pages", pages_root_id);
        dictionary.remove(b"Outlines");
        document
            .objects
            .insert(catalog_id, Object::Dictionary(dictionary));
    }

    document.trailer.set("Root", catalog_id);
    document.max_id = document.objects.len() as u32;
    document.renumber_objects();
    document.adjust_zero_pages();

    Ok(document)
}

/// Page count of a document.
pub fn page_count(doc: &Document) -> usize {
    doc.get_pages().len()
}

/// Serialize a document to bytes, compressing streams first.
pub fn to_bytes(doc: &mut Document) -> Result<Vec<u8>> {
    doc.compress();
    let mut bytes = Vec::new();
    doc.save_to(&mut bytes)?;
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::render_form;
    use innboard_core::FormKind;
    use serde_json::json;
    use std::io::Cursor;

    fn policy_doc() -> Document {
        render_form(
            FormKind::HumanTrafficking,
            &json!({ "personal_info": { "first_name": "Lee", "last_name": "Navarro" } }),
        )
        .unwrap()
        .doc
    }

    fn jpeg_bytes() -> Vec<u8> {
        let img = image::RgbImage::from_pixel(32, 24, image::Rgb([200, 180, 160]));
        let mut out = Cursor::new(Vec::new());
        image::DynamicImage::ImageRgb8(img)
            .write_to(&mut out, image::ImageFormat::Jpeg)
            .unwrap();
        out.into_inner()
    }

    #[test]
    fn test_classify_by_magic_bytes_overrides_declared() {
        // JPEG bytes with a wrong declared type still classify as image.
        assert_eq!(
            classify(&jpeg_bytes(), Some("application/octet-stream")),
            AttachmentClass::Image
        );
    }

    #[test]
    fn test_classify_unknown_bytes_falls_back_to_declared() {
        assert_eq!(
            classify(b"plain text", Some("image/png")),
            AttachmentClass::Image
        );
        assert_eq!(classify(b"plain text", None), AttachmentClass::Unsupported);
    }

    #[test]
    fn test_normalize_image_is_single_page() {
        let doc = normalize_attachment(&jpeg_bytes(), Some("image/jpeg"))
            .unwrap()
            .unwrap();
        assert_eq!(page_count(&doc), 1);
    }

    #[test]
    fn test_normalize_pdf_passes_pages_through() {
        let mut base = policy_doc();
        let pages = page_count(&base);
        let bytes = to_bytes(&mut base).unwrap();
        let doc = normalize_attachment(&bytes, Some("application/pdf"))
            .unwrap()
            .unwrap();
        assert_eq!(page_count(&doc), pages);
    }

    #[test]
    fn test_normalize_unsupported_is_none() {
        let result = normalize_attachment(b"csv,data,here", Some("text/csv")).unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn test_normalize_corrupt_pdf_is_error() {
        let mut bytes = b"%PDF-1.5 garbage".to_vec();
        bytes.extend_from_slice(&[0u8; 16]);
        assert!(matches!(
            normalize_attachment(&bytes, Some("application/pdf")),
            Err(PdfError::AttachmentConvert(_))
        ));
    }

    #[test]
    fn test_merge_preserves_order_and_counts() {
        let base = policy_doc();
        let base_pages = page_count(&base);
        let image_doc = normalize_attachment(&jpeg_bytes(), Some("image/jpeg"))
            .unwrap()
            .unwrap();

        let mut merged = merge_documents(vec![base, image_doc]).unwrap();
        assert_eq!(page_count(&merged), base_pages + 1);

        let bytes = to_bytes(&mut merged).unwrap();
        let reloaded = Document::load_mem(&bytes).unwrap();
        assert_eq!(reloaded.get_pages().len(), base_pages + 1);
    }

    #[test]
    fn test_merge_three_documents_in_slot_order() {
        let a = policy_doc();
        let a_pages = page_count(&a);
        let b = normalize_attachment(&jpeg_bytes(), Some("image/jpeg"))
            .unwrap()
            .unwrap();
        let c = normalize_attachment(&jpeg_bytes(), Some("image/jpeg"))
            .unwrap()
            .unwrap();
        let merged = merge_documents(vec![a, b, c]).unwrap();
        assert_eq!(page_count(&merged), a_pages + 2);
    }

    #[test]
    fn test_merge_empty_input_is_error() {
        assert!(matches!(
            merge_documents(Vec::new()),
            Err(PdfError::Structure(_))
        ));
    }

    #[test]
    fn test_merge_single_document_is_identity_on_pages() {
        let doc = policy_doc();
        let pages = page_count(&doc);
        let merged = merge_documents(vec![doc]).unwrap();
        assert_eq!(page_count(&merged), pages);
    }
}
