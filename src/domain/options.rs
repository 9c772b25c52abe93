//! Per-request options passed through to the collaborator.

use serde::{Deserialize, Serialize};

/// Options accepted on the query string of the OCR endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InferenceOptions {
    /// Disable stitching text across page boundaries.
    /// Default: false
    #[serde(default)]
    pub skip_cross_page_merge: bool,

    /// Maximum retry attempts per page, performed by the collaborator.
    /// Default: 2
    #[serde(default = "InferenceOptions::default_max_page_retries")]
    pub max_page_retries: u32,
}

impl InferenceOptions {
    /// Create options with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable or disable cross-page merging.
    pub fn with_skip_cross_page_merge(mut self, skip: bool) -> Self {
        self.skip_cross_page_merge = skip;
        self
    }

    /// Set the per-page retry budget.
    pub fn with_max_page_retries(mut self, retries: u32) -> Self {
        self.max_page_retries = retries;
        self
    }

    fn default_max_page_retries() -> u32 {
        2
    }
}

impl Default for InferenceOptions {
    fn default() -> Self {
        Self {
            skip_cross_page_merge: false,
            max_page_retries: Self::default_max_page_retries(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_empty_input() {
        let options: InferenceOptions = serde_json::from_str("{}").unwrap();
        assert_eq!(options, InferenceOptions::default());
        assert!(!options.skip_cross_page_merge);
        assert_eq!(options.max_page_retries, 2);
    }

    #[test]
    fn test_builder() {
        let options = InferenceOptions::new()
            .with_skip_cross_page_merge(true)
            .with_max_page_retries(5);
        assert!(options.skip_cross_page_merge);
        assert_eq!(options.max_page_retries, 5);
    }
}
