//! Core error types for the OCR service.
//!
//! This module defines the error taxonomy used across the service: request-level
//! errors surfaced to HTTP clients, inference errors produced at the model
//! boundary, and startup failures that prevent the service from becoming ready.

use std::path::PathBuf;
use thiserror::Error;

use crate::core::config::ConfigError;

/// Errors produced by the inference boundary.
///
/// A null result, an empty result and a collaborator error are all reported as
/// [`InferenceError::Failure`] so that callers see a single failure kind.
#[derive(Debug, Error)]
pub enum InferenceError {
    /// The model handle has not finished initializing.
    #[error("model is not loaded yet")]
    NotReady,

    /// The collaborator returned nothing usable.
    #[error("OCR parsing failed.")]
    EmptyResult,

    /// The collaborator raised an error or returned a malformed result.
    #[error("Error processing file: {message}")]
    Failure {
        /// Diagnostic message from the collaborator.
        message: String,
    },
}

impl InferenceError {
    /// Creates a failure carrying the collaborator's message.
    pub fn failure(message: impl Into<String>) -> Self {
        Self::Failure {
            message: message.into(),
        }
    }
}

/// Errors surfaced by request handlers.
///
/// Every variant maps to exactly one HTTP status; see the server module for
/// the translation.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The upload was rejected before any work was done.
    #[error("{message}")]
    Validation {
        /// A message describing what the client must fix.
        message: String,
    },

    /// Scratch file I/O failed.
    #[error("Error processing file: {0}")]
    Io(#[from] std::io::Error),

    /// Inference failed or returned an empty result.
    #[error(transparent)]
    Inference(InferenceError),

    /// The service is not ready to accept inference requests.
    #[error("model is not loaded yet")]
    NotReady,
}

impl ServiceError {
    /// Creates a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }
}

impl From<InferenceError> for ServiceError {
    fn from(error: InferenceError) -> Self {
        match error {
            InferenceError::NotReady => Self::NotReady,
            other => Self::Inference(other),
        }
    }
}

/// Errors that stop the model from loading.
///
/// These are fatal: the service never becomes ready and is not retried.
#[derive(Debug, Error)]
pub enum StartupFailure {
    /// The startup parameters are invalid.
    #[error("invalid model configuration")]
    Config(#[from] ConfigError),

    /// The model directory does not exist.
    #[error("model not found: {}", path.display())]
    ModelNotFound {
        /// The configured model location.
        path: PathBuf,
    },

    /// The scratch directory is missing or unusable.
    #[error("scratch directory unavailable: {}", path.display())]
    ScratchDir {
        /// The configured scratch directory.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The runtime failed while loading the model.
    #[error("model load failed for '{}': {reason}", model_path.display())]
    ModelLoad {
        /// The configured model location.
        model_path: PathBuf,
        /// Short reason string.
        reason: String,
        /// Underlying source error.
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl StartupFailure {
    /// Wraps a runtime error that occurred while loading the model.
    pub fn model_load(
        model_path: impl Into<PathBuf>,
        reason: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::ModelLoad {
            model_path: model_path.into(),
            reason: reason.into(),
            source: Some(Box::new(source)),
        }
    }
}
