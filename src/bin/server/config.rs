//! Configuration types for the OCR server and CLI.

use ocrflux_server::core::{ModelConfig, WorkerSettings};
use std::path::PathBuf;

/// Configuration for loading the model
#[derive(Clone)]
pub struct OcrConfig {
    pub model: ModelConfig,
    pub worker: WorkerSettings,
}

/// Configuration for the HTTP server
#[derive(Clone)]
pub struct ServerConfig {
    pub ocr: OcrConfig,
    pub host: String,
    pub port: u16,
    /// Directory for scratch files; the OS temp dir when unset.
    pub scratch_dir: Option<PathBuf>,
    pub max_upload_bytes: usize,
}
