//! Prediction Route

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::body::Bytes;
use axum::extract::multipart::{Multipart, MultipartError, MultipartRejection};
use axum::extract::State;
use axum::Json;
use ranking::PredictionResult;
use serde::Serialize;
use tracing::debug;

use crate::error::ApiError;
use crate::{telemetry, AppState};

/// Name of the multipart field carrying the image
pub const FILE_FIELD: &str = "file";

/// Successful prediction response
#[derive(Debug, Serialize)]
pub struct PredictionResponse {
    /// Top predictions as `{label: probability}`, most probable first
    pub predictions: PredictionResult,
    pub success: bool,
    pub message: String,
}

/// Classify an uploaded image
pub async fn predict(
    State(state): State<Arc<AppState>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<PredictionResponse>, ApiError> {
    let mut multipart = multipart.map_err(|e| ApiError::Upload {
        status: e.status(),
        message: e.body_text(),
    })?;
    let image = read_upload(&mut multipart).await?;

    let start = Instant::now();
    let predictions = run_with_deadline(&state, image, state.request_timeout).await?;
    let latency = start.elapsed();
    telemetry::record_success(latency);
    debug!("Classified upload in {}ms", latency.as_millis());

    Ok(Json(PredictionResponse {
        predictions,
        success: true,
        message: "Classification successful".to_string(),
    }))
}

/// Run the blocking pipeline off the async workers, bounded by `deadline`
async fn run_with_deadline(
    state: &AppState,
    image: Bytes,
    deadline: Duration,
) -> Result<PredictionResult, ApiError> {
    let classifier = state.classifier.clone();
    let job = tokio::task::spawn_blocking(move || classifier.classify(&image));

    match tokio::time::timeout(deadline, job).await {
        Ok(Ok(result)) => result,
        Ok(Err(join_error)) => Err(ApiError::Inference(format!("worker failed: {}", join_error))),
        Err(_) => Err(ApiError::Timeout(deadline.as_millis() as u64)),
    }
}

/// Take the `file` field, or failing that the first part that carries a file name
async fn read_upload(multipart: &mut Multipart) -> Result<Bytes, ApiError> {
    while let Some(field) = multipart.next_field().await.map_err(upload_error)? {
        let is_file = field.name() == Some(FILE_FIELD) || field.file_name().is_some();
        if is_file {
            let data = field.bytes().await.map_err(upload_error)?;
            debug!("Received upload of {} bytes", data.len());
            return Ok(data);
        }
    }

    Err(ApiError::MissingFile)
}

fn upload_error(e: MultipartError) -> ApiError {
    ApiError::Upload {
        status: e.status(),
        message: e.body_text(),
    }
}
