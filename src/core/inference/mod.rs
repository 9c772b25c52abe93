//! Inference boundary.
//!
//! The OCR model and its page handling live in an external collaborator. This
//! module defines the two seams used to reach it: a [`ModelRuntime`] that loads
//! the model once, and the [`DocumentParser`] it hands back for per-document
//! calls. [`InferenceHandle`] owns the loaded parser for the life of the
//! service.

pub mod handle;
pub mod protocol;
pub mod worker;

pub use handle::InferenceHandle;
pub use worker::{WorkerRuntime, WorkerSettings};

use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;

use crate::core::config::ModelConfig;
use crate::core::errors::StartupFailure;
use crate::domain::{InferenceOptions, InferenceResult};

/// Error raised by a collaborator during a parse call.
pub type ParseError = Box<dyn std::error::Error + Send + Sync>;

/// A loaded model able to parse documents.
#[async_trait]
pub trait DocumentParser: Send + Sync {
    /// Parse the document at `path`.
    ///
    /// `Ok(None)` means the collaborator finished without producing a result.
    async fn parse(
        &self,
        path: &Path,
        options: &InferenceOptions,
    ) -> Result<Option<InferenceResult>, ParseError>;

    /// Whether the model can still serve requests.
    fn is_alive(&self) -> bool {
        true
    }

    /// Release the model. Called once when the service stops.
    async fn shutdown(&self) {}
}

/// Loads the model described by a [`ModelConfig`].
#[async_trait]
pub trait ModelRuntime: Send + Sync {
    /// Load the model. Failures are fatal for the service.
    async fn load(&self, config: &ModelConfig) -> Result<Arc<dyn DocumentParser>, StartupFailure>;
}

#[cfg(test)]
pub(crate) mod testing;
