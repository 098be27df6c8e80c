//! Raster image embedding shared by the signature embedder and the
//! attachment merger.
//!
//! Images become an RGB XObject with a DeviceGray SMask carrying the alpha
//! channel, both zlib-compressed. Pixel rows are flipped vertically up
//! front because PDF image space runs bottom-up.

use flate2::write::ZlibEncoder;
use flate2::Compression;
use image::RgbaImage;
use lopdf::{dictionary, Document, Object, ObjectId, Stream};
use std::io::Write;

use crate::error::Result;

pub(crate) struct EmbeddedImage {
    pub xobject_id: ObjectId,
    pub width: u32,
    pub height: u32,
}

/// Add an RGBA image to the document as an XObject, returning its id and
/// pixel dimensions. The caller wires it into page resources and draws it
/// with a `cm`/`Do` content stream.
pub(crate) fn add_rgba_xobject(doc: &mut Document, img: &RgbaImage) -> Result<EmbeddedImage> {
    let mut img = img.clone();
    image::imageops::flip_vertical_in_place(&mut img);
    let (width, height) = img.dimensions();

    let mut rgb_buf = Vec::with_capacity((width * height * 3) as usize);
    let mut alpha_buf = Vec::with_capacity((width * height) as usize);
    for pixel in img.pixels() {
        let [r, g, b, a] = pixel.0;
        rgb_buf.extend_from_slice(&[r, g, b]);
        alpha_buf.push(a);
    }

    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(&rgb_buf)?;
    let compressed_rgb = encoder.finish()?;

    let mut alpha_encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    alpha_encoder.write_all(&alpha_buf)?;
    let compressed_alpha = alpha_encoder.finish()?;

    let smask_id = doc.add_object(Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => width as i64,
            "Height" => height as i64,
            "ColorSpace" => "DeviceGray",
            "BitsPerComponent" => 8,
            "Filter" => "FlateDecode",
        },
        compressed_alpha,
    ));

    let xobject_id = doc.add_object(Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => width as i64,
            "Height" => height as i64,
            "ColorSpace" => "DeviceRGB",
            "BitsPerComponent" => 8,
            "Filter" => "FlateDecode",
            "SMask" => Object::Reference(smask_id),
        },
        compressed_rgb,
    ));

    Ok(EmbeddedImage {
        xobject_id,
        width,
        height,
    })
}

/// Register an XObject under `name` in a page's resources.
///
/// Resources may live inline in the page dictionary or behind a shared
/// indirect reference; both shapes are handled.
pub(crate) fn register_page_xobject(
    doc: &mut Document,
    page_id: ObjectId,
    name: &str,
    xobject_id: ObjectId,
) -> Result<()> {
    let resources_ref = {
        let page = doc.get_object(page_id)?.as_dict()?;
        match page.get(b"Resources") {
            Ok(Object::Reference(rid)) => Some(*rid),
            _ => None,
        }
    };

    let resources = match resources_ref {
        Some(rid) => doc.get_object_mut(rid)?.as_dict_mut()?,
        None => {
            let dict = doc.get_object_mut(page_id)?.as_dict_mut()?;
            if !dict.has(b"Resources") {
                dict.set("Resources", Object::Dictionary(dictionary! {}));
            }
            dict.get_mut(b"Resources")?.as_dict_mut()?
        }
    };

    if !resources.has(b"XObject") {
        resources.set("XObject", Object::Dictionary(dictionary! {}));
    }
    let xobjects = resources.get_mut(b"XObject")?.as_dict_mut()?;
    xobjects.set(name.as_bytes().to_vec(), Object::Reference(xobject_id));

    Ok(())
}

/// Append a draw operation stream (`q cm /name Do Q`) to a page's contents.
pub(crate) fn append_draw_ops(
    doc: &mut Document,
    page_id: ObjectId,
    name: &str,
    x: f64,
    y: f64,
    draw_width: f64,
    draw_height: f64,
) -> Result<()> {
    let draw_ops = format!("q\n{draw_width} 0 0 {draw_height} {x} {y} cm\n/{name} Do\nQ\n");
    let stream = Stream::new(dictionary! {}, draw_ops.into_bytes());
    let stream_id = doc.add_object(stream);

    let page = doc.get_object_mut(page_id)?;
    let dict = page.as_dict_mut()?;
    let new_contents = match dict.remove(b"Contents") {
        Some(Object::Reference(existing)) => Object::Array(vec![
            Object::Reference(existing),
            Object::Reference(stream_id),
        ]),
        Some(Object::Array(mut array)) => {
            array.push(Object::Reference(stream_id));
            Object::Array(array)
        }
        _ => Object::Reference(stream_id),
    };
    dict.set("Contents", new_contents);

    Ok(())
}

/// Scale pixel dimensions to fit inside a bounding box, preserving aspect
/// ratio and never upscaling beyond the box.
pub(crate) fn fit_dimensions(
    width: u32,
    height: u32,
    max_width: f64,
    max_height: f64,
) -> (f64, f64) {
    let scale = (max_width / width as f64)
        .min(max_height / height as f64)
        .min(1.0);
    (width as f64 * scale, height as f64 * scale)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fit_dimensions_preserves_aspect() {
        let (w, h) = fit_dimensions(200, 100, 100.0, 100.0);
        assert!((w - 100.0).abs() < f64::EPSILON);
        assert!((h - 50.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_fit_dimensions_bounds_both_axes() {
        let (w, h) = fit_dimensions(100, 400, 300.0, 200.0);
        assert!(w <= 300.0 && h <= 200.0);
    }

    #[test]
    fn test_fit_dimensions_never_upscales() {
        let (w, h) = fit_dimensions(60, 20, 180.0, 54.0);
        assert!((w - 60.0).abs() < f64::EPSILON);
        assert!((h - 20.0).abs() < f64::EPSILON);
    }
}
