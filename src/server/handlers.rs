//! OCR request handlers.
//!
//! Both endpoints run the same pipeline: find the `file` field, validate its
//! name, stream it into a scratch file, run inference, then release the
//! scratch file before the response is built. They differ only in how the
//! result is shaped.

use axum::{
    extract::{rejection::QueryRejection, Query, State},
    Json,
};
use axum_extra::extract::multipart::{Field, Multipart, MultipartRejection};
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, warn};

use super::AppState;
use crate::core::errors::{ServiceError, ServiceResult};
use crate::domain::{is_pdf_bytes, InferenceOptions, InferenceResult, UploadedDocument};
use crate::utils::{ScratchDir, ScratchFile};

/// Name of the multipart field carrying the document.
pub const FILE_FIELD: &str = "file";

/// `POST /ocr/`: returns the document text as `text/plain`.
pub async fn ocr_text_handler(
    State(state): State<Arc<AppState>>,
    options: Result<Query<InferenceOptions>, QueryRejection>,
    multipart: Result<Multipart, MultipartRejection>,
) -> ServiceResult<String> {
    let (options, multipart) = accept(options, multipart)?;
    let result = process_upload(&state, options, multipart).await?;
    Ok(result.document_text)
}

/// `POST /ocr/full/`: returns the whole inference result as JSON.
pub async fn ocr_full_handler(
    State(state): State<Arc<AppState>>,
    options: Result<Query<InferenceOptions>, QueryRejection>,
    multipart: Result<Multipart, MultipartRejection>,
) -> ServiceResult<Json<InferenceResult>> {
    let (options, multipart) = accept(options, multipart)?;
    let result = process_upload(&state, options, multipart).await?;
    Ok(Json(result))
}

/// Turn extractor rejections into validation errors.
fn accept(
    options: Result<Query<InferenceOptions>, QueryRejection>,
    multipart: Result<Multipart, MultipartRejection>,
) -> ServiceResult<(InferenceOptions, Multipart)> {
    let Query(options) = options.map_err(|e| {
        warn!(error = %e, "Rejected query string");
        ServiceError::validation(e.body_text())
    })?;
    let multipart = multipart.map_err(|e| {
        warn!(error = %e, "Rejected request body");
        ServiceError::validation(e.body_text())
    })?;
    Ok((options, multipart))
}

async fn process_upload(
    state: &AppState,
    options: InferenceOptions,
    mut multipart: Multipart,
) -> ServiceResult<InferenceResult> {
    let request_id = uuid::Uuid::new_v4().to_string();
    let start = Instant::now();

    if !state.handle.is_loaded() {
        warn!(request_id = %request_id, "Rejecting request, model not loaded");
        return Err(ServiceError::NotReady);
    }

    let mut field = next_file_field(&mut multipart).await.map_err(|e| {
        warn!(request_id = %request_id, error = %e, "Rejected upload");
        e
    })?;

    let document = UploadedDocument::from_filename(field.file_name()).map_err(|e| {
        warn!(
            request_id = %request_id,
            filename = field.file_name().unwrap_or_default(),
            error = %e,
            "Rejected upload"
        );
        e
    })?;

    info!(
        request_id = %request_id,
        filename = %document.filename(),
        skip_cross_page_merge = options.skip_cross_page_merge,
        max_page_retries = options.max_page_retries,
        "Processing file"
    );

    let scratch = materialize(&state.scratch, &document, &mut field)
        .await
        .map_err(|e| {
            error!(request_id = %request_id, error = %e, "Failed to store upload");
            e
        })?;

    let outcome = state.handle.infer(scratch.path(), &options).await;

    if let Err(e) = scratch.release() {
        warn!(request_id = %request_id, error = %e, "Scratch file cleanup failed");
    }

    match outcome {
        Ok(result) => {
            info!(
                request_id = %request_id,
                num_pages = result.num_pages,
                fallback_pages = result.fallback_pages.len(),
                total_ms = start.elapsed().as_secs_f64() * 1000.0,
                "OCR completed"
            );
            Ok(result)
        }
        Err(e) => {
            error!(
                request_id = %request_id,
                filename = %document.filename(),
                error = %e,
                "Error processing file"
            );
            Err(e.into())
        }
    }
}

/// Skip over any other form fields until the document field is found.
async fn next_file_field(multipart: &mut Multipart) -> ServiceResult<Field> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ServiceError::validation(format!("Invalid multipart body: {e}")))?
    {
        if field.name() == Some(FILE_FIELD) {
            return Ok(field);
        }
    }
    Err(ServiceError::validation(format!(
        "Missing '{FILE_FIELD}' field in upload"
    )))
}

/// Copy the upload into a fresh scratch file.
///
/// On error the partially written file is dropped, which removes it.
async fn materialize(
    dir: &ScratchDir,
    document: &UploadedDocument,
    field: &mut Field,
) -> ServiceResult<ScratchFile> {
    let mut scratch = dir.acquire(&document.scratch_suffix()).await?;

    let mut first_chunk = true;
    while let Some(chunk) = field
        .chunk()
        .await
        .map_err(|e| ServiceError::validation(format!("Failed to read upload: {e}")))?
    {
        if first_chunk && !is_pdf_bytes(&chunk) {
            warn!(
                filename = %document.filename(),
                "Upload does not start with a PDF header"
            );
        }
        first_chunk = false;
        scratch.write_chunk(&chunk).await?;
    }
    scratch.finish().await?;

    Ok(scratch)
}
