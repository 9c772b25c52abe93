//! The core module of the OCR service.
//!
//! This module contains the fundamental components of the service, including:
//! - Configuration management
//! - Error handling
//! - Inference boundary and the model handle
//!
//! It also provides re-exports of commonly used types for convenience.

pub mod config;
pub mod errors;
pub mod inference;

pub use config::{ConfigError, ModelConfig};
pub use errors::{InferenceError, ServiceError, ServiceResult, StartupFailure};
pub use inference::{
    DocumentParser, InferenceHandle, ModelRuntime, ParseError, WorkerRuntime, WorkerSettings,
};
