//! Tensor Codec
//!
//! Turns compressed image bytes into the fixed-shape, normalized, channel-first
//! tensor a classification model expects.

mod codec;
mod profile;
mod tensor;

pub use codec::{DecodeLimits, TensorCodec};
pub use profile::NormalizationProfile;
pub use tensor::Tensor;

use thiserror::Error;

/// Errors during image encoding
#[derive(Debug, Clone, Error)]
pub enum CodecError {
    /// Bytes could not be parsed as a supported image
    #[error("Image decode failed: {0}")]
    Decode(String),

    /// Normalization profile parameters are unusable
    #[error("Invalid normalization profile: {0}")]
    InvalidProfile(String),
}
