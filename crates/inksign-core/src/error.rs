use thiserror::Error;

#[derive(Error, Debug)]
pub enum SignError {
    #[error("Failed to parse PDF: {0}")]
    ParseError(String),

    #[error("Page {page} out of range (document has {page_count} pages)")]
    PageOutOfRange { page: u32, page_count: u32 },

    #[error("Page {page} is rotated {rotation} degrees; placement needs an unrotated page")]
    RotatedPage { page: u32, rotation: i32 },

    #[error("Invalid placement size: {width}x{height}")]
    InvalidSize { width: f64, height: f64 },

    #[error("Signature is empty")]
    EmptySignature,

    #[error("Unsupported signature image: {0}")]
    UnsupportedImage(String),

    #[error("Failed to decode signature image: {0}")]
    ImageError(String),

    #[error("Failed to rasterize signature: {0}")]
    CaptureError(String),

    #[error("PDF operation failed: {0}")]
    OperationError(String),

    #[error("No document loaded")]
    NoDocument,

    #[error("Invalid configuration: {0}")]
    ConfigError(String),
}
