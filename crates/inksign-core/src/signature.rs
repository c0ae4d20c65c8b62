//! Encoded signature raster shared by placements

use std::fmt;
use std::sync::Arc;

use base64::Engine;

use crate::error::SignError;

const PNG_SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

/// Immutable encoded image bytes (PNG from the capture surface).
///
/// Clones share the same buffer, so one capture can back many placements.
#[derive(Clone, PartialEq, Eq)]
pub struct SignatureImage {
    bytes: Arc<[u8]>,
}

impl SignatureImage {
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        let bytes: Vec<u8> = bytes.into();
        Self {
            bytes: Arc::from(bytes),
        }
    }

    /// Decode a `data:<mime>;base64,<payload>` URL as emitted by canvas exports
    pub fn from_data_url(url: &str) -> Result<Self, SignError> {
        let rest = url
            .strip_prefix("data:")
            .ok_or_else(|| SignError::UnsupportedImage("not a data URL".to_string()))?;
        let (header, payload) = rest
            .split_once(',')
            .ok_or_else(|| SignError::UnsupportedImage("data URL has no payload".to_string()))?;
        if !header.ends_with(";base64") {
            return Err(SignError::UnsupportedImage(format!(
                "data URL is not base64 encoded: {}",
                header
            )));
        }

        let bytes = base64::engine::general_purpose::STANDARD
            .decode(payload.trim())
            .map_err(|e| SignError::ImageError(e.to_string()))?;
        Ok(Self::from_bytes(bytes))
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn is_png(&self) -> bool {
        self.bytes.starts_with(&PNG_SIGNATURE)
    }

    /// True when both handles point at the same buffer
    pub fn shares_buffer(&self, other: &SignatureImage) -> bool {
        Arc::ptr_eq(&self.bytes, &other.bytes)
    }
}

impl fmt::Debug for SignatureImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignatureImage")
            .field("len", &self.bytes.len())
            .field("png", &self.is_png())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_png_sniffing() {
        let mut bytes = PNG_SIGNATURE.to_vec();
        bytes.extend_from_slice(b"rest");
        assert!(SignatureImage::from_bytes(bytes).is_png());
        assert!(!SignatureImage::from_bytes(b"\xFF\xD8\xFF".to_vec()).is_png());
    }

    #[test]
    fn test_data_url_decodes() {
        let image = SignatureImage::from_data_url("data:image/png;base64,iVBORw0KGgo=").unwrap();
        assert!(image.is_png());
        assert_eq!(image.len(), 8);
    }

    #[test]
    fn test_data_url_rejects_plain_text() {
        let err = SignatureImage::from_data_url("data:text/plain,hello").unwrap_err();
        assert!(matches!(err, SignError::UnsupportedImage(_)));

        let err = SignatureImage::from_data_url("image.png").unwrap_err();
        assert!(matches!(err, SignError::UnsupportedImage(_)));
    }

    #[test]
    fn test_data_url_rejects_bad_base64() {
        let err = SignatureImage::from_data_url("data:image/png;base64,@@@").unwrap_err();
        assert!(matches!(err, SignError::ImageError(_)));
    }

    #[test]
    fn test_clones_share_buffer() {
        let a = SignatureImage::from_bytes(vec![1, 2, 3]);
        let b = a.clone();
        let c = SignatureImage::from_bytes(vec![1, 2, 3]);
        assert!(a.shares_buffer(&b));
        assert!(!a.shares_buffer(&c));
        assert_eq!(a, c);
    }
}
