//! Error types for the service.

mod types;

pub use types::{InferenceError, ServiceError, StartupFailure};

/// Result alias for request handlers.
pub type ServiceResult<T> = Result<T, ServiceError>;
