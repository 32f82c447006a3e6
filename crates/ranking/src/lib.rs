//! Ranking & Formatting
//!
//! Converts raw model scores into a probability distribution and picks the
//! top-k labeled predictions.

mod error;
mod labels;
mod rank;

pub use error::{LabelSetError, RankError};
pub use labels::LabelSet;
pub use rank::{rank, softmax, top_k_indices, Prediction, PredictionResult, DEFAULT_TOP_K};
