//! PDF input.
//!
//! Born-digital statements carry a text layer that is used as is. Scanned
//! statements are one image per page; those images are pulled out of the
//! page resources and handed to the OCR backend.

use image::{DynamicImage, GrayImage, ImageFormat, RgbImage};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream};
use tallyscan_core::RawDocumentText;
use tracing::{debug, trace};

use crate::intake::IntakeError;

/// Resource inheritance deeper than this is treated as a broken page tree.
const MAX_PAGE_TREE_DEPTH: usize = 32;

pub fn text_layer(data: &[u8]) -> Result<RawDocumentText, IntakeError> {
    let text = pdf_extract::extract_text_from_mem(data).map_err(|e| IntakeError::PdfText(e.to_string()))?;
    Ok(RawDocumentText::new(text))
}

/// Images drawn on each page, in page order.
pub fn page_images(data: &[u8]) -> Result<Vec<DynamicImage>, IntakeError> {
    let doc = Document::load_mem(data).map_err(|e| IntakeError::PdfText(e.to_string()))?;
    if doc.is_encrypted() {
        return Err(IntakeError::PdfText("document is encrypted".to_string()));
    }

    let mut images = Vec::new();
    for (number, page_id) in doc.get_pages() {
        let found = page_resources(&doc, page_id)
            .map(|resources| xobject_images(&doc, &resources))
            .unwrap_or_default();
        debug!(page = number, images = found.len(), "page images");
        images.extend(found);
    }
    Ok(images)
}

/// The page's `Resources`, or the nearest ancestor's.
fn page_resources(doc: &Document, page_id: ObjectId) -> Option<Dictionary> {
    let mut node = doc.get_dictionary(page_id).ok()?;
    for _ in 0..MAX_PAGE_TREE_DEPTH {
        if let Ok(resources) = node.get(b"Resources") {
            if let Ok((_, Object::Dictionary(dict))) = doc.dereference(resources) {
                return Some(dict.clone());
            }
        }
        let parent = node.get(b"Parent").ok()?.as_reference().ok()?;
        node = doc.get_dictionary(parent).ok()?;
    }
    None
}

fn xobject_images(doc: &Document, resources: &Dictionary) -> Vec<DynamicImage> {
    let Ok(xobjects) = resources.get(b"XObject") else {
        return Vec::new();
    };
    let Ok((_, Object::Dictionary(xobjects))) = doc.dereference(xobjects) else {
        return Vec::new();
    };
    xobjects
        .iter()
        .filter_map(|(_, obj)| match doc.dereference(obj) {
            Ok((_, Object::Stream(stream))) => decode_image(doc, stream),
            _ => None,
        })
        .collect()
}

/// JPEG streams and uncompressed or Flate 8-bit gray/RGB rasters. Fax,
/// JBIG2 and JPEG 2000 scans are skipped.
fn decode_image(doc: &Document, stream: &Stream) -> Option<DynamicImage> {
    let dict = &stream.dict;
    if dict.get(b"Subtype").ok()?.as_name().ok()? != b"Image" {
        return None;
    }
    let width = u32::try_from(dict.get(b"Width").ok()?.as_i64().ok()?).ok()?;
    let height = u32::try_from(dict.get(b"Height").ok()?.as_i64().ok()?).ok()?;

    match filter_name(dict) {
        Some(b"DCTDecode") => return image::load_from_memory_with_format(&stream.content, ImageFormat::Jpeg).ok(),
        Some(b"JPXDecode" | b"CCITTFaxDecode" | b"JBIG2Decode") => {
            trace!(width, height, "unsupported image filter");
            return None;
        }
        _ => {}
    }

    let bits = dict.get(b"BitsPerComponent").ok().and_then(|o| o.as_i64().ok()).unwrap_or(8);
    if bits != 8 {
        trace!(bits, "unsupported bits per component");
        return None;
    }

    let data = stream.decompressed_content().unwrap_or_else(|_| stream.content.clone());
    let pixels = (width as usize).checked_mul(height as usize)?;
    match color_space(doc, dict) {
        b"DeviceGray" | b"CalGray" | b"G" => {
            GrayImage::from_raw(width, height, data.get(..pixels)?.to_vec()).map(DynamicImage::ImageLuma8)
        }
        b"DeviceRGB" | b"CalRGB" | b"RGB" => {
            let len = pixels.checked_mul(3)?;
            RgbImage::from_raw(width, height, data.get(..len)?.to_vec()).map(DynamicImage::ImageRgb8)
        }
        other => {
            trace!(color_space = %String::from_utf8_lossy(other), "unsupported color space");
            None
        }
    }
}

fn filter_name(dict: &Dictionary) -> Option<&[u8]> {
    match dict.get(b"Filter").ok()? {
        Object::Name(name) => Some(name.as_slice()),
        Object::Array(filters) => filters.first().and_then(|o| o.as_name().ok()),
        _ => None,
    }
}

fn color_space<'a>(doc: &'a Document, dict: &'a Dictionary) -> &'a [u8] {
    dict.get(b"ColorSpace")
        .ok()
        .and_then(|o| match o {
            Object::Name(name) => Some(name.as_slice()),
            Object::Array(items) => items.first().and_then(|o| o.as_name().ok()),
            Object::Reference(id) => doc.get_object(*id).ok().and_then(|o| o.as_name().ok()),
            _ => None,
        })
        .unwrap_or(b"DeviceRGB")
}
