//! Softmax and top-k selection

use serde::ser::{Serialize, SerializeMap, Serializer};
use tracing::debug;

use crate::{LabelSet, RankError};

/// Number of predictions returned per request
pub const DEFAULT_TOP_K: usize = 5;

/// One labeled prediction
#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    /// Label from the model's label set
    pub label: String,
    /// Softmax probability in [0, 1]
    pub probability: f64,
    /// Model output index the label belongs to
    pub index: usize,
}

/// Top-k predictions, highest probability first.
///
/// Serializes as a JSON object `{label: probability}` with keys in rank order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PredictionResult {
    entries: Vec<Prediction>,
}

impl PredictionResult {
    /// Predictions in descending probability order
    pub fn entries(&self) -> &[Prediction] {
        &self.entries
    }

    /// Highest ranked prediction
    pub fn top(&self) -> Option<&Prediction> {
        self.entries.first()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Serialize for PredictionResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for prediction in &self.entries {
            map.serialize_entry(&prediction.label, &prediction.probability)?;
        }
        map.end()
    }
}

/// Numerically stable softmax: the maximum is subtracted before exponentiating
pub fn softmax(scores: &[f32]) -> Vec<f64> {
    let max = scores
        .iter()
        .map(|&s| s as f64)
        .fold(f64::NEG_INFINITY, f64::max);

    let exps: Vec<f64> = scores.iter().map(|&s| (s as f64 - max).exp()).collect();
    let sum: f64 = exps.iter().sum();

    exps.into_iter().map(|e| e / sum).collect()
}

/// Indices of the `k` largest scores, largest first, ties to the lower index
pub fn top_k_indices(scores: &[f32], k: usize) -> Vec<usize> {
    let mut indices: Vec<usize> = (0..scores.len()).collect();
    indices.sort_by(|&a, &b| scores[b].total_cmp(&scores[a]).then(a.cmp(&b)));
    indices.truncate(k);
    indices
}

/// Rank raw scores into the `k` most probable labeled predictions
pub fn rank(scores: &[f32], labels: &LabelSet, k: usize) -> Result<PredictionResult, RankError> {
    if scores.len() != labels.len() {
        return Err(RankError::IndexOutOfRange {
            scores: scores.len(),
            labels: labels.len(),
        });
    }

    if let Some((index, &value)) = scores.iter().enumerate().find(|(_, s)| !s.is_finite()) {
        return Err(RankError::NonFiniteScore { index, value });
    }

    let probabilities = softmax(scores);
    let mut entries = Vec::with_capacity(k.min(scores.len()));
    for index in top_k_indices(scores, k) {
        let label = labels.get(index).ok_or(RankError::IndexOutOfRange {
            scores: scores.len(),
            labels: labels.len(),
        })?;
        entries.push(Prediction {
            label: label.to_string(),
            probability: probabilities[index],
            index,
        });
    }

    if let Some(top) = entries.first() {
        debug!("Top prediction: {} ({:.4})", top.label, top.probability);
    }

    Ok(PredictionResult { entries })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn breeds() -> LabelSet {
        LabelSet::new([
            "Beagle",
            "Boxer",
            "Bulldog",
            "Dachshund",
            "German_Shepherd",
            "Golden_Retriever",
            "Labrador_Retriever",
            "Poodle",
            "Rottweiler",
            "Yorkshire_Terrier",
        ])
        .unwrap()
    }

    fn numbered(n: usize) -> LabelSet {
        LabelSet::new((0..n).map(|i| format!("class_{}", i))).unwrap()
    }

    #[test]
    fn test_softmax_sums_to_one() {
        let probs = softmax(&[1.0, 2.0, 3.0]);
        assert!((probs.iter().sum::<f64>() - 1.0).abs() < 1e-12);
        assert!(probs[2] > probs[1] && probs[1] > probs[0]);
    }

    #[test]
    fn test_softmax_large_values() {
        let mut scores = vec![0.0f32; 10];
        scores[0] = 1000.0;

        let probs = softmax(&scores);
        assert!(probs.iter().all(|p| p.is_finite()));
        assert!((probs[0] - 1.0).abs() < 1e-12);

        let result = rank(&scores, &breeds(), 5).unwrap();
        assert!(result.entries().iter().all(|p| p.probability.is_finite()));
        assert_eq!(result.top().unwrap().label, "Beagle");
    }

    #[test]
    fn test_known_logits() {
        let scores = [2.0, 1.0, 0.1, 0.1, 0.1, 0.1, 0.1, 0.1, 0.1, 0.1];
        let result = rank(&scores, &breeds(), 5).unwrap();

        let e = std::f64::consts::E;
        let denom = e * e + e + 8.0 * (0.1f32 as f64).exp();
        let expected = e * e / denom;

        let top = result.top().unwrap();
        assert_eq!(top.label, "Beagle");
        assert!((top.probability - expected).abs() < 1e-6);
        assert!((top.probability - 0.390).abs() < 1e-3);
        assert_eq!(result.entries()[1].label, "Boxer");
    }

    #[test]
    fn test_ties_prefer_lower_index() {
        let scores = [0.1, 0.1, 0.1, 0.1, 0.1, 0.1, 0.1, 0.1, 0.1, 0.1];
        let result = rank(&scores, &breeds(), 5).unwrap();
        let indices: Vec<usize> = result.entries().iter().map(|p| p.index).collect();
        assert_eq!(indices, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_fewer_labels_than_k() {
        let result = rank(&[0.5, 1.5, -0.5], &numbered(3), 5).unwrap();
        assert_eq!(result.len(), 3);
        assert_eq!(result.top().unwrap().label, "class_1");
    }

    #[test]
    fn test_length_mismatch() {
        let result = rank(&[1.0, 2.0], &breeds(), 5);
        assert!(matches!(
            result,
            Err(RankError::IndexOutOfRange { scores: 2, labels: 10 })
        ));
    }

    #[test]
    fn test_non_finite_score() {
        let result = rank(&[1.0, f32::NAN, 0.0], &numbered(3), 5);
        assert!(matches!(result, Err(RankError::NonFiniteScore { index: 1, .. })));

        let result = rank(&[f32::INFINITY, 0.0, 0.0], &numbered(3), 5);
        assert!(matches!(result, Err(RankError::NonFiniteScore { index: 0, .. })));
    }

    #[test]
    fn test_serializes_in_rank_order() {
        let result = rank(&[0.0, 3.0, 1.0], &numbered(3), 2).unwrap();
        let json = serde_json::to_string(&result).unwrap();

        let first = json.find("class_1").unwrap();
        let second = json.find("class_2").unwrap();
        assert!(first < second);
        assert!(!json.contains("class_0"));
    }

    fn brute_force_top_k(scores: &[f32], k: usize) -> Vec<usize> {
        let mut remaining: Vec<usize> = (0..scores.len()).collect();
        let mut picked = Vec::new();
        while picked.len() < k && !remaining.is_empty() {
            let mut best = 0;
            for pos in 1..remaining.len() {
                if scores[remaining[pos]] > scores[remaining[best]] {
                    best = pos;
                }
            }
            picked.push(remaining.remove(best));
        }
        picked
    }

    proptest! {
        #[test]
        fn prop_rank_matches_brute_force(scores in prop::collection::vec(-50.0f32..50.0, 1..30)) {
            let labels = numbered(scores.len());
            let result = rank(&scores, &labels, DEFAULT_TOP_K).unwrap();

            prop_assert_eq!(result.len(), DEFAULT_TOP_K.min(scores.len()));

            let mut expected = brute_force_top_k(&scores, DEFAULT_TOP_K);
            let mut actual: Vec<usize> = result.entries().iter().map(|p| p.index).collect();
            expected.sort_unstable();
            actual.sort_unstable();
            prop_assert_eq!(actual, expected);

            for prediction in result.entries() {
                prop_assert!((0.0..=1.0).contains(&prediction.probability));
                prop_assert!(labels.contains(&prediction.label));
            }
        }
    }
}
