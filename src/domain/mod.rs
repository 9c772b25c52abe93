//! Domain types shared by the handlers and the inference boundary.

pub mod options;
pub mod result;
pub mod upload;

pub use options::InferenceOptions;
pub use result::InferenceResult;
pub use upload::{is_pdf_bytes, is_supported_document, UploadedDocument};
