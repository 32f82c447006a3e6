//! Ranking Error Types

use thiserror::Error;

/// Errors while building a label set
#[derive(Debug, Clone, Error)]
pub enum LabelSetError {
    /// No labels given
    #[error("Label set is empty")]
    Empty,

    /// A label appears more than once
    #[error("Duplicate label: {0}")]
    Duplicate(String),

    /// A label is empty or whitespace only
    #[error("Blank label at position {0}")]
    Blank(usize),

    /// Label file could not be read
    #[error("Failed to read label file: {0}")]
    Io(String),
}

/// Errors while ranking raw scores
#[derive(Debug, Clone, Error)]
pub enum RankError {
    /// Score vector and label set disagree in length
    #[error("Index out of range: {scores} scores for {labels} labels")]
    IndexOutOfRange { scores: usize, labels: usize },

    /// A raw score is NaN or infinite
    #[error("Non-finite score {value} at index {index}")]
    NonFiniteScore { index: usize, value: f32 },
}
