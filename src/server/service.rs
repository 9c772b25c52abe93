//! Service object with explicit lifecycle.
//!
//! [`OcrService`] owns everything a request needs. `start()` loads the model
//! and `stop()` releases it, so the service can be driven from tests without
//! binding a listener.

use axum::Router;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::info;

use super::{health, router, AppState, HealthResponse, DEFAULT_MAX_UPLOAD_BYTES};
use crate::core::errors::StartupFailure;
use crate::core::inference::InferenceHandle;
use crate::utils::ScratchDir;

pub struct OcrService {
    state: Arc<AppState>,
    max_upload_bytes: usize,
    stopped: AtomicBool,
}

impl OcrService {
    pub fn new(handle: Arc<InferenceHandle>, scratch: ScratchDir) -> Self {
        Self {
            state: Arc::new(AppState { handle, scratch }),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            stopped: AtomicBool::new(false),
        }
    }

    /// Set the largest accepted request body, in bytes.
    pub fn with_max_upload_bytes(mut self, max_upload_bytes: usize) -> Self {
        self.max_upload_bytes = max_upload_bytes;
        self
    }

    pub fn handle(&self) -> &Arc<InferenceHandle> {
        &self.state.handle
    }

    /// Check the scratch directory and load the model.
    ///
    /// Must complete before the router is exposed to traffic. Calling it again
    /// after a successful start does nothing.
    pub async fn start(&self) -> Result<(), StartupFailure> {
        let root = self.state.scratch.root();
        match tokio::fs::metadata(root).await {
            Ok(meta) if meta.is_dir() => {}
            Ok(_) => {
                return Err(StartupFailure::ScratchDir {
                    path: root.to_path_buf(),
                    source: std::io::Error::new(
                        std::io::ErrorKind::Other,
                        "not a directory",
                    ),
                })
            }
            Err(source) => {
                return Err(StartupFailure::ScratchDir {
                    path: root.to_path_buf(),
                    source,
                })
            }
        }

        self.state.handle.initialize().await
    }

    /// Release the model. Only the first call has an effect.
    pub async fn stop(&self) {
        if self.stopped.swap(true, Ordering::SeqCst) {
            return;
        }
        info!("Shutting down OCR service");
        self.state.handle.shutdown().await;
    }

    /// Current health report.
    pub fn health(&self) -> HealthResponse {
        health(&self.state.handle)
    }

    /// Router serving this service's endpoints.
    pub fn router(&self) -> Router {
        router(self.state.clone(), self.max_upload_bytes)
    }
}
