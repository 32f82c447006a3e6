//! Inference backends

use tensor_codec::Tensor;
use tracing::info;

use crate::InferenceError;

/// A loaded model that maps one input tensor to a vector of raw class scores
pub trait Backend: Send + Sync {
    /// Short backend name for logs
    fn name(&self) -> &str;

    /// Whether `run` may be called from several threads at once.
    ///
    /// The engine serializes calls to backends that return `false`.
    fn is_reentrant(&self) -> bool {
        true
    }

    /// Run one inference
    fn run(&self, input: &Tensor) -> Result<Vec<f32>, InferenceError>;
}

/// Backend that ignores its input and returns a fixed logit vector.
///
/// Used for development without a model artifact and as a test double.
#[derive(Debug, Clone)]
pub struct FixedLogitsBackend {
    logits: Vec<f32>,
}

impl FixedLogitsBackend {
    /// Create a backend returning `logits` for every input
    pub fn new(logits: Vec<f32>) -> Self {
        info!("Creating fixed-logits backend with {} classes", logits.len());
        Self { logits }
    }
}

impl Backend for FixedLogitsBackend {
    fn name(&self) -> &str {
        "fixed-logits"
    }

    fn run(&self, _input: &Tensor) -> Result<Vec<f32>, InferenceError> {
        Ok(self.logits.clone())
    }
}
