//! The record produced by the OCR collaborator for one document.

use serde::{Deserialize, Serialize};

/// Output of a single parse call.
///
/// Built entirely by the collaborator. The service reads it and re-serializes
/// it but never changes it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InferenceResult {
    /// Full reconstructed document text.
    pub document_text: String,
    /// Text of every page, in page order.
    pub page_texts: Vec<String>,
    /// Zero-based indices of pages that were replaced with a fallback.
    #[serde(default)]
    pub fallback_pages: Vec<usize>,
    /// Number of pages processed.
    pub num_pages: usize,
}

impl InferenceResult {
    /// True when the collaborator produced no pages and no text.
    pub fn is_empty(&self) -> bool {
        self.num_pages == 0 && self.document_text.is_empty()
    }

    /// Check the page-count invariants.
    ///
    /// `page_texts` must hold one entry per page and every fallback index must
    /// refer to an existing page.
    pub fn validate(&self) -> Result<(), String> {
        if self.page_texts.len() != self.num_pages {
            return Err(format!(
                "result reports {} pages but carries {} page texts",
                self.num_pages,
                self.page_texts.len()
            ));
        }
        if let Some(page) = self
            .fallback_pages
            .iter()
            .find(|&&page| page >= self.num_pages)
        {
            return Err(format!(
                "fallback page {} is out of range for a {}-page document",
                page, self.num_pages
            ));
        }
        Ok(())
    }
}
