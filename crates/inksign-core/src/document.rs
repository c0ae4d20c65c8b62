//! Source document decoding
//!
//! Extracts the page count and native page geometry needed to map
//! placements. Rasterizing pages for display is left to the host.

use lopdf::{Dictionary, Document, Object, ObjectId};
use serde::Serialize;
use tracing::{info, warn};

use crate::coords::{PageBox, PageLayout};
use crate::error::SignError;

// Guards against cyclic /Parent chains in malformed files
const MAX_TREE_DEPTH: usize = 32;

/// Information about a single PDF page
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageInfo {
    /// Page number (1-indexed)
    pub page_num: u32,
    /// MediaBox in points (1 point = 1/72 inch)
    pub media_box: PageBox,
    /// Page rotation in degrees (0, 90, 180, 270)
    pub rotation: i32,
}

/// A decoded PDF plus the bytes it was decoded from
#[derive(Debug, Clone)]
pub struct SourceDocument {
    bytes: Vec<u8>,
    pages: Vec<PageInfo>,
}

impl SourceDocument {
    /// Decode `bytes`; malformed input or a document without pages fails
    pub fn load(bytes: Vec<u8>) -> Result<Self, SignError> {
        let doc = Document::load_mem(&bytes).map_err(|e| SignError::ParseError(e.to_string()))?;

        let page_ids = doc.get_pages();
        if page_ids.is_empty() {
            return Err(SignError::ParseError("document has no pages".to_string()));
        }

        let mut pages = Vec::with_capacity(page_ids.len());
        for (page_num, page_id) in page_ids {
            let info = PageInfo::from_page(&doc, page_num, page_id)?;
            if info.rotation != 0 {
                warn!(
                    page = page_num,
                    rotation = info.rotation,
                    "Rotated page; signatures cannot be placed on it"
                );
            }
            pages.push(info);
        }

        info!(pages = pages.len(), bytes = bytes.len(), "Document decoded");
        Ok(Self { bytes, pages })
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn page_count(&self) -> u32 {
        self.pages.len() as u32
    }

    pub fn pages(&self) -> &[PageInfo] {
        &self.pages
    }

    /// 1-based page lookup
    pub fn page(&self, page_num: u32) -> Option<&PageInfo> {
        if page_num == 0 {
            return None;
        }
        self.pages.get(page_num as usize - 1)
    }

    /// # Panics
    ///
    /// Panics if `scale` is zero, negative, or not finite.
    pub fn layout(&self, scale: f64) -> PageLayout {
        PageLayout::new(self.pages.iter().map(|p| p.media_box).collect(), scale)
    }
}

impl PageInfo {
    fn from_page(doc: &Document, page_num: u32, page_id: ObjectId) -> Result<Self, SignError> {
        let media_box = match inherited_attribute(doc, page_id, b"MediaBox") {
            Some(obj) => parse_box(doc, obj).map_err(|e| {
                SignError::ParseError(format!("page {}: {}", page_num, e))
            })?,
            // Default to US Letter size
            None => PageBox::new(612.0, 792.0),
        };

        let rotation = inherited_attribute(doc, page_id, b"Rotate")
            .and_then(|obj| obj.as_i64().ok())
            .map(normalize_rotation)
            .unwrap_or(0);

        Ok(Self {
            page_num,
            media_box,
            rotation,
        })
    }
}

/// Look up a page attribute, walking the `/Parent` chain for inheritable keys.
/// References are resolved.
pub(crate) fn inherited_attribute<'a>(
    doc: &'a Document,
    page_id: ObjectId,
    key: &[u8],
) -> Option<&'a Object> {
    let mut current = Some(page_id);
    for _ in 0..MAX_TREE_DEPTH {
        let id = current?;
        let dict = doc.get_object(id).and_then(Object::as_dict).ok()?;
        if let Ok(value) = dict.get(key) {
            return resolve(doc, value);
        }
        current = parent_of(dict);
    }
    None
}

fn parent_of(dict: &Dictionary) -> Option<ObjectId> {
    dict.get(b"Parent").and_then(Object::as_reference).ok()
}

pub(crate) fn resolve<'a>(doc: &'a Document, obj: &'a Object) -> Option<&'a Object> {
    match obj {
        Object::Reference(id) => doc.get_object(*id).ok(),
        other => Some(other),
    }
}

fn parse_box(doc: &Document, obj: &Object) -> Result<PageBox, String> {
    let array = obj
        .as_array()
        .map_err(|_| "MediaBox is not an array".to_string())?;
    if array.len() != 4 {
        return Err("MediaBox must have 4 elements".to_string());
    }

    let mut corners = [0.0; 4];
    for (i, item) in array.iter().enumerate() {
        corners[i] = resolve(doc, item)
            .and_then(obj_to_f64)
            .ok_or_else(|| format!("MediaBox element {} is not a number", i))?;
    }

    let page_box = PageBox::from_corners(corners);
    if page_box.width <= 0.0 || page_box.height <= 0.0 {
        return Err("MediaBox has zero area".to_string());
    }
    Ok(page_box)
}

fn obj_to_f64(obj: &Object) -> Option<f64> {
    match obj {
        Object::Integer(n) => Some(*n as f64),
        Object::Real(n) => Some(*n as f64),
        _ => None,
    }
}

/// Normalize rotation to 0, 90, 180, or 270
fn normalize_rotation(angle: i64) -> i32 {
    // reduce before narrowing; the result always fits
    angle.rem_euclid(360) as i32
}
