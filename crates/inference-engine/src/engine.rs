//! Inference Engine Implementation

use std::path::Path;
use std::sync::{Mutex, PoisonError};
use std::time::Instant;

use tensor_codec::{NormalizationProfile, Tensor};
use tracing::{debug, error, info};

use crate::backend::{Backend, FixedLogitsBackend};
use crate::onnx::OnnxBackend;
use crate::InferenceError;

/// Loaded, warmed-up classification model.
///
/// Construction always performs a warm-up inference, so a value of this type
/// is ready to serve. It is read-only afterwards and can be shared behind an
/// `Arc` by any number of concurrent callers.
pub struct InferenceEngine {
    /// Loaded model
    backend: Box<dyn Backend>,
    /// Input layout the model was loaded with
    profile: NormalizationProfile,
    /// Expected length of the output vector
    num_classes: usize,
    /// Serializes calls into backends that are not re-entrant
    gate: Option<Mutex<()>>,
}

impl InferenceEngine {
    /// Load an ONNX model from disk and warm it up
    pub fn load(
        model_path: impl AsRef<Path>,
        profile: NormalizationProfile,
        num_classes: usize,
    ) -> Result<Self, InferenceError> {
        let backend = OnnxBackend::load(model_path, &profile)?;
        Self::with_backend(Box::new(backend), profile, num_classes)
    }

    /// Create an engine around a fixed-logits backend
    pub fn mock(logits: Vec<f32>, profile: NormalizationProfile) -> Result<Self, InferenceError> {
        info!("Creating mock inference engine");
        let num_classes = logits.len();
        Self::with_backend(Box::new(FixedLogitsBackend::new(logits)), profile, num_classes)
    }

    /// Wrap an already loaded backend and warm it up
    pub fn with_backend(
        backend: Box<dyn Backend>,
        profile: NormalizationProfile,
        num_classes: usize,
    ) -> Result<Self, InferenceError> {
        if num_classes == 0 {
            return Err(InferenceError::ModelLoadError(
                "model must have at least one output class".to_string(),
            ));
        }

        let gate = if backend.is_reentrant() {
            None
        } else {
            info!("Backend '{}' is not re-entrant, serializing inference calls", backend.name());
            Some(Mutex::new(()))
        };

        let engine = Self {
            backend,
            profile,
            num_classes,
            gate,
        };
        engine.warm_up()?;
        Ok(engine)
    }

    /// Run one synthetic inference; any failure counts as a load failure
    fn warm_up(&self) -> Result<(), InferenceError> {
        let start = Instant::now();
        let input = Tensor::zeros(&self.profile);

        match self.run(&input) {
            Ok(_) => {
                info!(
                    "Warm-up inference on '{}' completed in {}ms",
                    self.backend.name(),
                    start.elapsed().as_millis()
                );
                Ok(())
            }
            Err(e) => {
                error!("Warm-up inference failed: {}", e);
                Err(InferenceError::ModelLoadError(format!("warm-up inference failed: {}", e)))
            }
        }
    }

    /// Run inference, returning exactly `num_classes` raw scores
    pub fn run(&self, input: &Tensor) -> Result<Vec<f32>, InferenceError> {
        let expected = self.profile.input_shape();
        if input.shape() != expected {
            return Err(InferenceError::InvalidInputShape {
                expected: format!("{:?}", expected),
                actual: format!("{:?}", input.shape()),
            });
        }

        let start = Instant::now();
        let scores = match &self.gate {
            Some(gate) => {
                // The guard protects no data, so a poisoned lock is still usable
                let _guard = gate.lock().unwrap_or_else(PoisonError::into_inner);
                self.backend.run(input)?
            }
            None => self.backend.run(input)?,
        };

        if scores.len() != self.num_classes {
            return Err(InferenceError::OutputLength {
                expected: self.num_classes,
                actual: scores.len(),
            });
        }

        debug!("Inference completed in {}us", start.elapsed().as_micros());
        Ok(scores)
    }

    /// Number of output classes
    pub fn num_classes(&self) -> usize {
        self.num_classes
    }

    /// Input profile the model expects
    pub fn profile(&self) -> &NormalizationProfile {
        &self.profile
    }

    /// Backend name
    pub fn backend_name(&self) -> &str {
        self.backend.name()
    }
}
