//! HTTP server for OCR processing.

use crate::config::ServerConfig;
use ocrflux_server::core::{InferenceHandle, WorkerRuntime};
use ocrflux_server::server::OcrService;
use ocrflux_server::utils::ScratchDir;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{error, info};

/// Run the HTTP server
pub async fn run_server(
    config: ServerConfig,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let runtime = Arc::new(WorkerRuntime::new(config.ocr.worker.clone()));
    let handle = Arc::new(InferenceHandle::new(config.ocr.model.clone(), runtime));
    let scratch = config
        .scratch_dir
        .clone()
        .map(ScratchDir::new)
        .unwrap_or_default();
    let service = OcrService::new(handle, scratch).with_max_upload_bytes(config.max_upload_bytes);

    // Load the model before accepting any traffic
    info!("Initializing OCR model...");
    if let Err(e) = service.start().await {
        error!(error = %e, "Failed to load model");
        return Err(e.into());
    }
    info!("OCR model initialized successfully");

    // Parse address
    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .map_err(|e| format!("Invalid address: {}", e))?;

    info!("Server listening on http://{}", addr);
    info!("Endpoints:");
    info!("  GET  /health     - Health check");
    info!("  POST /ocr/       - Document text");
    info!("  POST /ocr/full/  - Full OCR result (JSON)");

    // Create listener
    let listener = tokio::net::TcpListener::bind(addr).await?;

    // Run server with graceful shutdown
    let served = axum::serve(listener, service.router())
        .with_graceful_shutdown(shutdown_signal())
        .await;

    service.stop().await;
    served?;

    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, starting graceful shutdown...");
        }
        _ = terminate => {
            info!("Received SIGTERM, starting graceful shutdown...");
        }
    }
}
