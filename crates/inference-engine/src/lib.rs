//! ONNX Inference Engine
//!
//! Owns the single loaded classification model and runs it on normalized input
//! tensors. Models are validated with a warm-up inference before they are handed
//! out, so an [`InferenceEngine`] value always refers to a usable model.

mod backend;
mod engine;
mod onnx;

pub use backend::{Backend, FixedLogitsBackend};
pub use engine::InferenceEngine;
pub use onnx::OnnxBackend;

use thiserror::Error;

/// Errors during model loading and inference
#[derive(Debug, Clone, Error)]
pub enum InferenceError {
    #[error("Model load failed: {0}")]
    ModelLoadError(String),
    #[error("Inference failed: {0}")]
    InferenceFailed(String),
    #[error("Invalid input shape: expected {expected}, got {actual}")]
    InvalidInputShape { expected: String, actual: String },
    #[error("Unexpected output length: expected {expected}, got {actual}")]
    OutputLength { expected: usize, actual: usize },
}

impl InferenceError {
    /// Whether this error prevents the engine from being used at all
    pub fn is_fatal(&self) -> bool {
        matches!(self, InferenceError::ModelLoadError(_))
    }
}
