//! Error types for PDF operations.

use thiserror::Error;

/// PDF engine errors.
#[derive(Error, Debug)]
pub enum PdfError {
    /// Required form fields are absent.
    #[error("Missing required fields: {}", .0.join(", "))]
    MissingFields(Vec<String>),

    /// Signature image bytes could not be decoded as a raster image.
    #[error("Signature image decode failed: {0}")]
    SignatureDecode(String),

    /// Target page does not exist in the document.
    #[error("Page {0} not found")]
    PageNotFound(u32),

    /// Attachment bytes could not be parsed/converted into pages.
    #[error("Attachment conversion failed: {0}")]
    AttachmentConvert(String),

    /// Document assembly produced an inconsistent structure.
    #[error("Document structure error: {0}")]
    Structure(String),

    /// Underlying lopdf failure.
    #[error("PDF error: {0}")]
    Pdf(#[from] lopdf::Error),

    /// Stream compression or serialization I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for PDF operations.
pub type Result<T> = std::result::Result<T, PdfError>;

impl From<PdfError> for innboard_core::Error {
    fn from(e: PdfError) -> Self {
        match e {
            PdfError::MissingFields(fields) => innboard_core::Error::MissingFields(fields),
            PdfError::SignatureDecode(msg) => innboard_core::Error::SignatureDecode(msg),
            other => innboard_core::Error::Document(other.to_string()),
        }
    }
}
