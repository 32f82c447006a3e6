//! Normalization profile

use serde::{Deserialize, Serialize};

use crate::CodecError;

/// Per-channel normalization statistics and target input size
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NormalizationProfile {
    /// Per-channel mean, RGB order, in [0, 1] units
    pub mean: [f32; 3],
    /// Per-channel standard deviation, RGB order
    pub std: [f32; 3],
    /// Target width in pixels
    pub width: u32,
    /// Target height in pixels
    pub height: u32,
}

impl NormalizationProfile {
    /// ImageNet statistics at 160x160, the layout the bundled classifier was trained on
    pub const IMAGENET_160: Self = Self {
        mean: [0.485, 0.456, 0.406],
        std: [0.229, 0.224, 0.225],
        width: 160,
        height: 160,
    };

    /// Create a validated profile
    pub fn new(mean: [f32; 3], std: [f32; 3], width: u32, height: u32) -> Result<Self, CodecError> {
        if width == 0 || height == 0 {
            return Err(CodecError::InvalidProfile(format!(
                "target size must be non-zero, got {}x{}",
                width, height
            )));
        }

        if let Some(s) = std.iter().find(|s| !s.is_finite() || **s == 0.0) {
            return Err(CodecError::InvalidProfile(format!(
                "standard deviation must be finite and non-zero, got {}",
                s
            )));
        }

        if mean.iter().any(|m| !m.is_finite()) {
            return Err(CodecError::InvalidProfile("mean must be finite".to_string()));
        }

        Ok(Self { mean, std, width, height })
    }

    /// Model input shape `(1, 3, H, W)`
    pub fn input_shape(&self) -> [usize; 4] {
        [1, 3, self.height as usize, self.width as usize]
    }

    /// Number of f32 elements in one input tensor
    pub fn input_len(&self) -> usize {
        self.input_shape().iter().product()
    }

    /// Normalize one 8-bit channel value
    #[inline]
    pub fn normalize(&self, channel: usize, value: u8) -> f32 {
        (value as f32 / 255.0 - self.mean[channel]) / self.std[channel]
    }
}

impl Default for NormalizationProfile {
    fn default() -> Self {
        Self::IMAGENET_160
    }
}
