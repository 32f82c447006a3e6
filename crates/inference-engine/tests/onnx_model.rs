//! Runs the tract backend against a small checked-in model.
//!
//! `fixtures/tiny.onnx` averages each input channel over the image
//! (`ReduceMean` over H and W) and multiplies the three means by a 3x10 weight
//! matrix. An all-ones input therefore yields the column sums of the weights.

use inference_engine::{InferenceEngine, InferenceError};
use ndarray::Array4;
use tensor_codec::{NormalizationProfile, Tensor};

const TINY_MODEL: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/tiny.onnx");

const ONES_SCORES: [f32; 10] = [0.6, -1.2, 1.8, -2.4, 3.0, -3.6, 4.2, -4.8, 5.4, -6.0];

fn ones(profile: &NormalizationProfile) -> Tensor {
    Tensor::from_array(Array4::ones(profile.input_shape()))
}

#[test]
fn test_load_tiny_model() {
    let engine = InferenceEngine::load(TINY_MODEL, NormalizationProfile::default(), 10).unwrap();
    assert_eq!(engine.num_classes(), 10);
    assert_eq!(engine.backend_name(), "onnx");
}

#[test]
fn test_run_returns_one_score_per_class() {
    let profile = NormalizationProfile::default();
    let engine = InferenceEngine::load(TINY_MODEL, profile, 10).unwrap();

    let scores = engine.run(&ones(&profile)).unwrap();
    assert_eq!(scores.len(), 10);
    for (score, expected) in scores.iter().zip(ONES_SCORES) {
        assert!((score - expected).abs() < 1e-4, "{} vs {}", score, expected);
    }
}

#[test]
fn test_run_is_deterministic() {
    let profile = NormalizationProfile::default();
    let engine = InferenceEngine::load(TINY_MODEL, profile, 10).unwrap();
    let input = ones(&profile);

    let first = engine.run(&input).unwrap();
    let second = engine.run(&input).unwrap();
    assert_eq!(
        first.iter().map(|s| s.to_bits()).collect::<Vec<_>>(),
        second.iter().map(|s| s.to_bits()).collect::<Vec<_>>()
    );
}

#[test]
fn test_zero_input_gives_zero_scores() {
    let profile = NormalizationProfile::default();
    let engine = InferenceEngine::load(TINY_MODEL, profile, 10).unwrap();

    let scores = engine.run(&Tensor::zeros(&profile)).unwrap();
    assert!(scores.iter().all(|s| *s == 0.0));
}

#[test]
fn test_class_count_mismatch_fails_warm_up() {
    let result = InferenceEngine::load(TINY_MODEL, NormalizationProfile::default(), 9);
    match result {
        Err(err @ InferenceError::ModelLoadError(_)) => {
            assert!(err.is_fatal());
            assert!(err.to_string().contains("expected 9, got 10"));
        }
        Err(other) => panic!("unexpected error: {}", other),
        Ok(_) => panic!("model with 10 outputs loaded for 9 classes"),
    }
}
