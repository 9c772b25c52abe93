//! CLI mode for OCR processing.

use crate::config::OcrConfig;
use ocrflux_server::core::{InferenceHandle, WorkerRuntime};
use ocrflux_server::domain::{is_supported_document, InferenceOptions, InferenceResult};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

/// Process a local PDF file
pub async fn process_file(
    path: &Path,
    config: &OcrConfig,
    options: InferenceOptions,
    output_format: &str,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let name = path.to_string_lossy();
    if !is_supported_document(&name) {
        return Err(format!("Only PDF files are supported: {}", path.display()).into());
    }
    if !path.is_file() {
        return Err(format!("File not found: {}", path.display()).into());
    }

    let start = Instant::now();
    info!("Initializing OCR model...");
    let runtime = Arc::new(WorkerRuntime::new(config.worker.clone()));
    let handle = InferenceHandle::new(config.model.clone(), runtime);
    handle.initialize().await?;
    info!("Model loaded in {:.2}ms", start.elapsed().as_secs_f64() * 1000.0);

    info!("Processing {}...", path.display());
    let ocr_start = Instant::now();
    let outcome = handle.infer(path, &options).await;
    let processing_time = ocr_start.elapsed();
    handle.shutdown().await;

    let result = outcome?;
    info!(
        "OCR completed in {:.2}ms",
        processing_time.as_secs_f64() * 1000.0
    );

    output_result(&result, output_format)?;
    Ok(())
}

/// Output the OCR result in the specified format
fn output_result(
    result: &InferenceResult,
    format: &str,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    match format {
        "json" => {
            println!("{}", serde_json::to_string(result)?);
        }
        "text" => {
            println!("{}", result.document_text);
        }
        _ => {
            println!("\n=== OCR Results ===");
            println!("Total pages: {}", result.num_pages);
            if !result.fallback_pages.is_empty() {
                let pages: Vec<String> = result
                    .fallback_pages
                    .iter()
                    .map(|page| (page + 1).to_string())
                    .collect();
                println!("Fallback pages: {}", pages.join(", "));
            }
            println!();

            for (idx, text) in result.page_texts.iter().enumerate() {
                println!("========== Page {} ==========", idx + 1);
                println!("{}", text);
                println!();
            }

            println!("========== Document Text ==========");
            println!("{}", result.document_text);
        }
    }

    Ok(())
}
