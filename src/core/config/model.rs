//! Startup configuration for the OCR model.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::ConfigError;

/// Parameters used to load the model once at startup.
///
/// These are fixed for the lifetime of the process and are never visible to,
/// or changeable by, individual requests.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Location of the model weights.
    /// Default: `/model_dir/OCRFlux-3B`
    #[serde(default = "ModelConfig::default_model_path")]
    pub model_path: PathBuf,

    /// Fraction of accelerator memory the runtime may claim, in `(0.0, 1.0]`.
    /// Default: 0.8
    #[serde(default = "ModelConfig::default_gpu_memory_utilization")]
    pub gpu_memory_utilization: f32,

    /// Maximum context length (token budget) of the model.
    /// Default: 8192
    #[serde(default = "ModelConfig::default_max_model_len")]
    pub max_model_len: u32,
}

impl ModelConfig {
    /// Create a configuration for the model at `model_path` with default limits.
    pub fn new(model_path: impl Into<PathBuf>) -> Self {
        Self {
            model_path: model_path.into(),
            ..Self::default()
        }
    }

    /// Set the accelerator memory utilization fraction.
    pub fn with_gpu_memory_utilization(mut self, fraction: f32) -> Self {
        self.gpu_memory_utilization = fraction;
        self
    }

    /// Set the maximum context length.
    pub fn with_max_model_len(mut self, max_model_len: u32) -> Self {
        self.max_model_len = max_model_len;
        self
    }

    /// Check the parameters before handing them to the runtime.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.model_path.as_os_str().is_empty() {
            return Err(ConfigError::InvalidField {
                field: "model_path",
                message: "must not be empty".to_string(),
            });
        }
        if !(self.gpu_memory_utilization > 0.0 && self.gpu_memory_utilization <= 1.0) {
            return Err(ConfigError::InvalidField {
                field: "gpu_memory_utilization",
                message: format!(
                    "expected a fraction in (0.0, 1.0], got {}",
                    self.gpu_memory_utilization
                ),
            });
        }
        if self.max_model_len == 0 {
            return Err(ConfigError::InvalidField {
                field: "max_model_len",
                message: "must be greater than zero".to_string(),
            });
        }
        Ok(())
    }

    fn default_model_path() -> PathBuf {
        PathBuf::from("/model_dir/OCRFlux-3B")
    }

    fn default_gpu_memory_utilization() -> f32 {
        0.8
    }

    fn default_max_model_len() -> u32 {
        8192
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            model_path: Self::default_model_path(),
            gpu_memory_utilization: Self::default_gpu_memory_utilization(),
            max_model_len: Self::default_max_model_len(),
        }
    }
}
