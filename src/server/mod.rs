//! HTTP surface of the OCR service.
//!
//! # Endpoints
//!
//! - `GET  /health`     - Liveness and model readiness
//! - `POST /ocr/`       - Document text as `text/plain`
//! - `POST /ocr/full/`  - Full inference result as JSON

pub mod error;
pub mod handlers;
pub mod health;
pub mod service;

pub use error::ErrorResponse;
pub use health::{health, HealthResponse};
pub use service::OcrService;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::core::inference::InferenceHandle;
use crate::utils::ScratchDir;

/// Default cap on the size of an upload, in bytes.
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 256 * 1024 * 1024;

/// Application state shared across handlers
pub struct AppState {
    pub handle: Arc<InferenceHandle>,
    pub scratch: ScratchDir,
}

/// Build the router for `state`.
pub fn router(state: Arc<AppState>, max_upload_bytes: usize) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health::health_handler))
        .route("/ocr", post(handlers::ocr_text_handler))
        .route("/ocr/", post(handlers::ocr_text_handler))
        .route("/ocr/full", post(handlers::ocr_full_handler))
        .route("/ocr/full/", post(handlers::ocr_full_handler))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
