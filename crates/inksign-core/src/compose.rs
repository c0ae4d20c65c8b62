//! Composite signature images into PDF page content

use std::collections::BTreeMap;
use std::io::Write;

use flate2::write::ZlibEncoder;
use flate2::Compression;
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream};
use tracing::{debug, info};

use crate::document::{inherited_attribute, resolve};
use crate::error::SignError;
use crate::projector::ProjectedPlacement;
use crate::signature::SignatureImage;

const XOBJECT_PREFIX: &str = "InkSig";

/// Draw every projected placement onto its page and serialize the result.
///
/// An empty placement list returns the input unchanged. The input bytes are
/// never modified; on error nothing is produced.
pub fn compose_signed_pdf(
    pdf_bytes: &[u8],
    placements: &[ProjectedPlacement],
) -> Result<Vec<u8>, SignError> {
    if placements.is_empty() {
        // No changes, return original
        return Ok(pdf_bytes.to_vec());
    }

    if let Some(bad) = placements.iter().find(|p| !p.image.is_png()) {
        return Err(SignError::UnsupportedImage(format!(
            "placement {} is not a PNG image",
            bad.id
        )));
    }

    let mut doc =
        Document::load_mem(pdf_bytes).map_err(|e| SignError::ParseError(e.to_string()))?;
    let pages = doc.get_pages();

    let mut by_page: BTreeMap<u32, Vec<&ProjectedPlacement>> = BTreeMap::new();
    for placement in placements {
        by_page.entry(placement.page).or_default().push(placement);
    }

    info!(
        placements = placements.len(),
        pages = by_page.len(),
        "Compositing signatures"
    );

    let mut embedded: Vec<(SignatureImage, ObjectId)> = Vec::new();
    for (page_num, page_placements) in by_page {
        let page_id = *pages.get(&page_num).ok_or(SignError::PageOutOfRange {
            page: page_num,
            page_count: pages.len() as u32,
        })?;

        let mut content = String::new();
        for placement in page_placements {
            let image_id = match embedded
                .iter()
                .find(|(image, _)| image.shares_buffer(&placement.image) || *image == placement.image)
            {
                Some((_, id)) => *id,
                None => {
                    let id = embed_png(&mut doc, &placement.image)?;
                    embedded.push((placement.image.clone(), id));
                    id
                }
            };

            let name = register_xobject(&mut doc, page_id, image_id)?;
            let rect = placement.rect;
            content.push_str(&format!(
                "q {:.4} 0 0 {:.4} {:.4} {:.4} cm /{} Do Q\n",
                rect.width, rect.height, rect.x, rect.y, name
            ));
            debug!(page = page_num, id = placement.id, xobject = %name, "Signature drawn");
        }

        wrap_page_contents(&mut doc, page_id, content.into_bytes())?;
    }

    let mut output = Vec::new();
    doc.save_to(&mut output)
        .map_err(|e| SignError::OperationError(e.to_string()))?;

    info!(bytes = output.len(), "Signed PDF serialized");
    Ok(output)
}

struct DecodedImage {
    width: u32,
    height: u32,
    color_space: &'static str,
    color: Vec<u8>,
    alpha: Option<Vec<u8>>,
}

fn decode_png(bytes: &[u8]) -> Result<DecodedImage, SignError> {
    let mut decoder = png::Decoder::new(bytes);
    decoder.set_transformations(png::Transformations::EXPAND | png::Transformations::STRIP_16);
    let mut reader = decoder
        .read_info()
        .map_err(|e| SignError::ImageError(e.to_string()))?;

    let mut buf = vec![0; reader.output_buffer_size()];
    let frame = reader
        .next_frame(&mut buf)
        .map_err(|e| SignError::ImageError(e.to_string()))?;
    let data = &buf[..frame.buffer_size()];

    let (color_space, channels, has_alpha) = match frame.color_type {
        png::ColorType::Rgba => ("DeviceRGB", 4, true),
        png::ColorType::Rgb => ("DeviceRGB", 3, false),
        png::ColorType::GrayscaleAlpha => ("DeviceGray", 2, true),
        png::ColorType::Grayscale => ("DeviceGray", 1, false),
        png::ColorType::Indexed => {
            return Err(SignError::UnsupportedImage(
                "indexed PNG was not expanded".to_string(),
            ))
        }
    };

    let (color, alpha) = if has_alpha {
        let color_channels = channels - 1;
        let pixels = data.len() / channels;
        let mut color = Vec::with_capacity(pixels * color_channels);
        let mut alpha = Vec::with_capacity(pixels);
        for pixel in data.chunks_exact(channels) {
            color.extend_from_slice(&pixel[..color_channels]);
            alpha.push(pixel[color_channels]);
        }
        (color, Some(alpha))
    } else {
        (data.to_vec(), None)
    };

    Ok(DecodedImage {
        width: frame.width,
        height: frame.height,
        color_space,
        color,
        alpha,
    })
}

fn deflate(data: &[u8]) -> Result<Vec<u8>, SignError> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder
        .write_all(data)
        .map_err(|e| SignError::OperationError(e.to_string()))?;
    encoder
        .finish()
        .map_err(|e| SignError::OperationError(e.to_string()))
}

/// Add the image (and its soft mask) as XObjects, returning the image id
fn embed_png(doc: &mut Document, image: &SignatureImage) -> Result<ObjectId, SignError> {
    let decoded = decode_png(image.bytes())?;

    let mut image_dict = dictionary! {
        "Type" => "XObject",
        "Subtype" => "Image",
        "Width" => decoded.width as i64,
        "Height" => decoded.height as i64,
        "ColorSpace" => decoded.color_space,
        "BitsPerComponent" => 8,
        "Filter" => "FlateDecode",
    };

    if let Some(alpha) = &decoded.alpha {
        let smask = Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => decoded.width as i64,
                "Height" => decoded.height as i64,
                "ColorSpace" => "DeviceGray",
                "BitsPerComponent" => 8,
                "Filter" => "FlateDecode",
            },
            deflate(alpha)?,
        );
        let smask_id = doc.add_object(smask);
        image_dict.set("SMask", smask_id);
    }

    let image_id = doc.add_object(Stream::new(image_dict, deflate(&decoded.color)?));
    debug!(
        width = decoded.width,
        height = decoded.height,
        masked = decoded.alpha.is_some(),
        "Signature image embedded"
    );
    Ok(image_id)
}

/// Name `image_id` in the page's XObject resources.
///
/// Resources inherited from the page tree (or shared by reference) are
/// copied onto the page first so other pages are unaffected.
fn register_xobject(
    doc: &mut Document,
    page_id: ObjectId,
    image_id: ObjectId,
) -> Result<String, SignError> {
    let mut resources = inherited_attribute(doc, page_id, b"Resources")
        .and_then(|obj| obj.as_dict().ok())
        .cloned()
        .unwrap_or_else(Dictionary::new);

    let mut xobjects = resources
        .get(b"XObject")
        .ok()
        .and_then(|obj| resolve(doc, obj))
        .and_then(|obj| obj.as_dict().ok())
        .cloned()
        .unwrap_or_else(Dictionary::new);

    let mut index = 0usize;
    let name = loop {
        let candidate = format!("{}{}", XOBJECT_PREFIX, index);
        if !xobjects.has(candidate.as_bytes()) {
            break candidate;
        }
        index += 1;
    };

    xobjects.set(name.clone(), Object::Reference(image_id));
    resources.set("XObject", Object::Dictionary(xobjects));

    page_dict_mut(doc, page_id)?.set("Resources", Object::Dictionary(resources));
    Ok(name)
}

/// Isolate existing page content in `q … Q`, then append `content`
fn wrap_page_contents(
    doc: &mut Document,
    page_id: ObjectId,
    content: Vec<u8>,
) -> Result<(), SignError> {
    let existing: Vec<Object> = {
        let page = doc
            .get_object(page_id)
            .and_then(Object::as_dict)
            .map_err(|e| SignError::OperationError(e.to_string()))?;
        match page.get(b"Contents") {
            Ok(Object::Reference(id)) => match doc.get_object(*id) {
                Ok(Object::Array(items)) => items.clone(),
                _ => vec![Object::Reference(*id)],
            },
            Ok(Object::Array(items)) => items.clone(),
            _ => Vec::new(),
        }
    };

    let save_id = doc.add_object(Stream::new(dictionary! {}, b"q\n".to_vec()));
    // leading newline: content streams are concatenated without separators
    let mut drawing = b"\nQ\n".to_vec();
    drawing.extend_from_slice(&content);
    let draw_id = doc.add_object(Stream::new(dictionary! {}, drawing));

    let mut contents = Vec::with_capacity(existing.len() + 2);
    contents.push(Object::Reference(save_id));
    contents.extend(existing);
    contents.push(Object::Reference(draw_id));

    page_dict_mut(doc, page_id)?.set("Contents", Object::Array(contents));
    Ok(())
}

fn page_dict_mut(doc: &mut Document, page_id: ObjectId) -> Result<&mut Dictionary, SignError> {
    doc.get_object_mut(page_id)
        .and_then(Object::as_dict_mut)
        .map_err(|e| SignError::OperationError(e.to_string()))
}
