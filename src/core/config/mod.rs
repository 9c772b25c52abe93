//! Configuration management for the OCR service.
//!
//! This module provides the startup configuration for the model and the
//! validation errors reported when it is malformed.

pub mod model;

pub use model::ModelConfig;

use thiserror::Error;

/// Errors raised while validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A field holds a value outside its accepted range.
    #[error("invalid value for field '{field}': {message}")]
    InvalidField {
        /// The offending field.
        field: &'static str,
        /// What was expected.
        message: String,
    },
}
