//! Signature embedder: overlays a captured signature image onto a fixed
//! rectangle of a rendered form.
//!
//! Whether this step runs is the preview/final decision point: an artifact
//! with no burned-in signature is a preview and must never be persisted.
//! A corrupt signature image degrades the artifact to preview rather than
//! aborting the request; the caller owns that policy, this module only
//! reports the decode failure.

use image::RgbaImage;
use lopdf::Document;

pub use innboard_core::SignaturePlacement;

use crate::error::{PdfError, Result};
use crate::images::{add_rgba_xobject, append_draw_ops, fit_dimensions, register_page_xobject};

/// Resource name the signature XObject is registered under.
const SIGNATURE_XOBJECT_NAME: &str = "SigImg";

/// Decode `image_bytes` (PNG or JPEG) and stamp the signature onto the
/// document at the given placement, scaled to fit the rectangle.
pub fn embed_signature(
    doc: &mut Document,
    image_bytes: &[u8],
    placement: SignaturePlacement,
) -> Result<()> {
    let img = decode_signature_image(image_bytes)?;

    let pages = doc.get_pages();
    let page_id = *pages
        .get(&placement.page)
        .ok_or(PdfError::PageNotFound(placement.page))?;

    let embedded = add_rgba_xobject(doc, &img)?;
    register_page_xobject(doc, page_id, SIGNATURE_XOBJECT_NAME, embedded.xobject_id)?;

    let (draw_w, draw_h) = fit_dimensions(
        embedded.width,
        embedded.height,
        placement.width,
        placement.height,
    );
    append_draw_ops(
        doc,
        page_id,
        SIGNATURE_XOBJECT_NAME,
        placement.x,
        placement.y,
        draw_w,
        draw_h,
    )
}

/// Decode signature bytes into an RGBA raster, mapping any decode failure
/// to [`PdfError::SignatureDecode`].
pub fn decode_signature_image(image_bytes: &[u8]) -> Result<RgbaImage> {
    image::load_from_memory(image_bytes)
        .map(|img| img.to_rgba8())
        .map_err(|e| PdfError::SignatureDecode(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::render_form;
    use innboard_core::FormKind;
    use serde_json::json;
    use std::io::Cursor;

    fn png_bytes() -> Vec<u8> {
        let img = image::RgbaImage::from_pixel(12, 6, image::Rgba([10, 20, 30, 255]));
        let mut out = Cursor::new(Vec::new());
        image::DynamicImage::ImageRgba8(img)
            .write_to(&mut out, image::ImageFormat::Png)
            .unwrap();
        out.into_inner()
    }

    fn rendered_policy() -> Document {
        render_form(
            FormKind::WeaponsPolicy,
            &json!({ "personal_info": { "first_name": "Dev", "last_name": "Okafor" } }),
        )
        .unwrap()
        .doc
    }

    #[test]
    fn test_embed_signature_keeps_page_count() {
        let mut doc = rendered_policy();
        let before = doc.get_pages().len();
        embed_signature(&mut doc, &png_bytes(), SignaturePlacement::default()).unwrap();
        assert_eq!(doc.get_pages().len(), before);
    }

    #[test]
    fn test_embedded_document_reloads() {
        let mut doc = rendered_policy();
        embed_signature(&mut doc, &png_bytes(), SignaturePlacement::default()).unwrap();
        let mut bytes = Vec::new();
        doc.save_to(&mut bytes).unwrap();
        assert!(Document::load_mem(&bytes).is_ok());
    }

    #[test]
    fn test_corrupt_image_is_decode_error() {
        let mut doc = rendered_policy();
        let err = embed_signature(&mut doc, b"definitely not an image", Default::default())
            .unwrap_err();
        assert!(matches!(err, PdfError::SignatureDecode(_)));
    }

    #[test]
    fn test_missing_page_is_page_not_found() {
        let mut doc = rendered_policy();
        let placement = SignaturePlacement {
            page: 99,
            ..Default::default()
        };
        let err = embed_signature(&mut doc, &png_bytes(), placement).unwrap_err();
        assert!(matches!(err, PdfError::PageNotFound(99)));
    }
}
