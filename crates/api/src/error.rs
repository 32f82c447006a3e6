//! API Error Types

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use inference_engine::InferenceError;
use ranking::{LabelSetError, RankError};
use serde::Serialize;
use tensor_codec::CodecError;
use thiserror::Error;
use tracing::{error, warn};

use crate::telemetry;

/// Per-request failures, converted into a uniform JSON failure response
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Decode failed: {0}")]
    Decode(String),
    #[error("Inference failed: {0}")]
    Inference(String),
    #[error("Request timed out after {0}ms")]
    Timeout(u64),
    #[error("Index out of range: {scores} scores for {labels} labels")]
    IndexOutOfRange { scores: usize, labels: usize },
    #[error("No file field in upload")]
    MissingFile,
    #[error("Invalid upload: {message}")]
    Upload { status: StatusCode, message: String },
}

impl ApiError {
    /// Stable identifier reported to clients and used as a metrics label
    pub fn kind(&self) -> &'static str {
        match self {
            ApiError::Decode(_) => "decode_error",
            ApiError::Inference(_) => "inference_error",
            ApiError::Timeout(_) => "timeout",
            ApiError::IndexOutOfRange { .. } => "index_out_of_range",
            ApiError::MissingFile => "missing_file",
            ApiError::Upload { .. } => "invalid_upload",
        }
    }

    /// HTTP status for this failure
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::MissingFile => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Upload { status, .. } => *status,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Short client-facing message without internal detail
    pub fn public_message(&self) -> String {
        match self {
            ApiError::Decode(_) => "Error processing image: could not decode image".to_string(),
            ApiError::Inference(_) => "Error processing image: inference failed".to_string(),
            ApiError::Timeout(_) => "Error processing image: request timed out".to_string(),
            ApiError::IndexOutOfRange { .. } => {
                "Error processing image: internal configuration error".to_string()
            }
            ApiError::MissingFile => "No image file found in upload".to_string(),
            ApiError::Upload { message, .. } => format!("Invalid upload: {}", message),
        }
    }
}

impl From<CodecError> for ApiError {
    fn from(e: CodecError) -> Self {
        ApiError::Decode(e.to_string())
    }
}

impl From<InferenceError> for ApiError {
    fn from(e: InferenceError) -> Self {
        ApiError::Inference(e.to_string())
    }
}

impl From<RankError> for ApiError {
    fn from(e: RankError) -> Self {
        match e {
            RankError::IndexOutOfRange { scores, labels } => {
                ApiError::IndexOutOfRange { scores, labels }
            }
            RankError::NonFiniteScore { .. } => ApiError::Inference(e.to_string()),
        }
    }
}

/// Failure body for every non-200 response
#[derive(Debug, Serialize)]
pub struct FailureResponse {
    pub success: bool,
    pub message: String,
    pub error: &'static str,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match &self {
            ApiError::IndexOutOfRange { .. } => {
                error!("Label set does not match model output, check deployment: {}", self)
            }
            ApiError::Inference(_) | ApiError::Timeout(_) => error!("{}", self),
            _ => warn!("{}", self),
        }
        telemetry::record_failure(self.kind());

        let body = FailureResponse {
            success: false,
            message: self.public_message(),
            error: self.kind(),
        };
        (self.status(), Json(body)).into_response()
    }
}

/// Errors that stop the server from starting
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("Label set error: {0}")]
    Labels(#[from] LabelSetError),
    #[error("{0}")]
    Model(#[from] InferenceError),
    #[error("Model has {outputs} outputs but {labels} labels are configured")]
    LabelMismatch { outputs: usize, labels: usize },
    #[error("Codec and model were configured with different input profiles")]
    ProfileMismatch,
    #[error("Metrics exporter error: {0}")]
    Metrics(#[from] metrics_exporter_prometheus::BuildError),
    #[error("Server I/O error: {0}")]
    Io(#[from] std::io::Error),
}
