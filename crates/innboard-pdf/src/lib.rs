//! # innboard-pdf
//!
//! PDF engine for the innboard onboarding document subsystem:
//!
//! - [`render`] — fills a static form layout with structured applicant
//!   data, producing an unsigned document (pure).
//! - [`signature`] — overlays a captured signature image onto a fixed
//!   rectangle (the preview/final decision point).
//! - [`merge`] — normalizes heterogeneous attachments (images, PDFs) into
//!   page sequences and appends them to the base document in fixed slot
//!   order.
//!
//! All operations are synchronous and CPU-bound; callers dispatch them
//! through `tokio::task::spawn_blocking`.

pub mod error;
mod images;
pub mod merge;
pub mod render;
pub mod signature;

pub use error::{PdfError, Result};
pub use lopdf::Document;
pub use merge::{classify, merge_documents, normalize_attachment, page_count, to_bytes, AttachmentClass};
pub use render::{render_form, required_fields, validate_required, RenderedForm};
pub use signature::{decode_signature_image, embed_signature, SignaturePlacement};
