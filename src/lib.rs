//! # ocrflux-server
//!
//! HTTP service that exposes a document OCR model. The model is loaded once at
//! startup by an external worker process; each request uploads a PDF, which is
//! written to a request-scoped scratch file, parsed by the model, and answered
//! with either the document text or the full per-page result.
//!
//! ## Modules
//!
//! - [`core`]: configuration, errors, and the inference boundary
//! - [`domain`]: results, options and upload validation
//! - [`server`]: axum router, handlers and the service lifecycle
//! - [`utils`]: scratch files and logging setup
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use ocrflux_server::core::{InferenceHandle, ModelConfig, WorkerRuntime, WorkerSettings};
//! use ocrflux_server::server::OcrService;
//! use ocrflux_server::utils::ScratchDir;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
//! let runtime = WorkerRuntime::new(
//!     WorkerSettings::new("python3").with_args(["-m", "ocrflux.worker"]),
//! );
//! let handle = Arc::new(InferenceHandle::new(
//!     ModelConfig::new("/model_dir/OCRFlux-3B"),
//!     Arc::new(runtime),
//! ));
//! let service = OcrService::new(handle, ScratchDir::system());
//! service.start().await?;
//!
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:8000").await?;
//! axum::serve(listener, service.router()).await?;
//! service.stop().await;
//! # Ok(())
//! # }
//! ```

pub mod core;
pub mod domain;
pub mod server;
pub mod utils;
