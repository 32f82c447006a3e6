//! Decode → infer → rank pipeline

use std::fmt;

use inference_engine::InferenceEngine;
use ranking::{rank, LabelSet, PredictionResult, DEFAULT_TOP_K};
use tensor_codec::TensorCodec;
use tracing::{debug, warn};

use crate::error::{ApiError, StartupError};

/// Stage a prediction request is in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestStage {
    Received,
    Decoding,
    Inferring,
    Ranking,
    Responded,
}

impl fmt::Display for RequestStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RequestStage::Received => "received",
            RequestStage::Decoding => "decoding",
            RequestStage::Inferring => "inferring",
            RequestStage::Ranking => "ranking",
            RequestStage::Responded => "responded",
        };
        f.write_str(name)
    }
}

/// Read-only classification service shared by all requests
pub struct Classifier {
    codec: TensorCodec,
    engine: InferenceEngine,
    labels: LabelSet,
    top_k: usize,
}

impl Classifier {
    /// Combine a warmed-up engine with its label set
    pub fn new(
        codec: TensorCodec,
        engine: InferenceEngine,
        labels: LabelSet,
    ) -> Result<Self, StartupError> {
        if engine.num_classes() != labels.len() {
            return Err(StartupError::LabelMismatch {
                outputs: engine.num_classes(),
                labels: labels.len(),
            });
        }

        if codec.profile() != engine.profile() {
            return Err(StartupError::ProfileMismatch);
        }

        Ok(Self {
            codec,
            engine,
            labels,
            top_k: DEFAULT_TOP_K,
        })
    }

    /// Classify image bytes. Blocking; call from a blocking-capable thread.
    pub fn classify(&self, bytes: &[u8]) -> Result<PredictionResult, ApiError> {
        debug!("Request {} ({} bytes)", RequestStage::Received, bytes.len());

        let tensor = self
            .codec
            .encode(bytes)
            .map_err(|e| failed(RequestStage::Decoding, e.into()))?;

        let scores = self
            .engine
            .run(&tensor)
            .map_err(|e| failed(RequestStage::Inferring, e.into()))?;

        let result = rank(&scores, &self.labels, self.top_k)
            .map_err(|e| failed(RequestStage::Ranking, e.into()))?;

        debug!("Request {} with {} predictions", RequestStage::Responded, result.len());
        Ok(result)
    }

    pub fn labels(&self) -> &LabelSet {
        &self.labels
    }

    pub fn engine(&self) -> &InferenceEngine {
        &self.engine
    }
}

fn failed(stage: RequestStage, err: ApiError) -> ApiError {
    warn!("Request failed while {}: {}", stage, err);
    err
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::{default_labels, mock_logits};
    use tensor_codec::NormalizationProfile;

    fn classifier() -> Classifier {
        let profile = NormalizationProfile::default();
        let engine = InferenceEngine::mock(mock_logits(10), profile).unwrap();
        Classifier::new(TensorCodec::default(), engine, default_labels()).unwrap()
    }

    #[test]
    fn test_label_mismatch_rejected() {
        let profile = NormalizationProfile::default();
        let engine = InferenceEngine::mock(mock_logits(3), profile).unwrap();
        let result = Classifier::new(TensorCodec::default(), engine, default_labels());
        assert!(matches!(
            result,
            Err(StartupError::LabelMismatch { outputs: 3, labels: 10 })
        ));
    }

    #[test]
    fn test_decode_failure_kind() {
        let err = classifier().classify(b"not an image").unwrap_err();
        assert_eq!(err.kind(), "decode_error");
    }

    #[test]
    fn test_accessors() {
        let classifier = classifier();
        assert_eq!(classifier.labels().len(), 10);
        assert_eq!(classifier.engine().num_classes(), 10);
        assert_eq!(classifier.engine().backend_name(), "fixed-logits");
    }

    #[test]
    fn test_stage_names() {
        assert_eq!(RequestStage::Inferring.to_string(), "inferring");
        assert_eq!(RequestStage::Responded.to_string(), "responded");
    }
}
