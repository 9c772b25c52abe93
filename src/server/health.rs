//! Liveness and readiness reporting.

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::AppState;
use crate::core::inference::InferenceHandle;

/// Health check response
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct HealthResponse {
    pub status: String,
    pub model_loaded: bool,
}

/// Report liveness and whether the model has finished loading.
///
/// No live call is made to the model.
pub fn health(handle: &InferenceHandle) -> HealthResponse {
    HealthResponse {
        status: "healthy".to_string(),
        model_loaded: handle.is_loaded(),
    }
}

/// Health check endpoint
pub async fn health_handler(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(health(&state.handle))
}
