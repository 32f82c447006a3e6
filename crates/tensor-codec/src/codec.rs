//! Image bytes to tensor encoding

use std::io::Cursor;

use image::imageops::{self, FilterType};
use image::{DynamicImage, ImageReader, Limits};
use ndarray::Array4;
use tracing::debug;

use crate::{CodecError, NormalizationProfile, Tensor};

/// Resampling filter used for every resize. Triangle is bilinear interpolation;
/// it is implemented in pure Rust by the `image` crate, so the output does not
/// depend on the platform.
pub const RESAMPLING_FILTER: FilterType = FilterType::Triangle;

/// Upper bounds applied while decoding untrusted bytes
#[derive(Debug, Clone, Copy)]
pub struct DecodeLimits {
    /// Maximum decoded width or height in pixels
    pub max_dimension: u32,
}

impl Default for DecodeLimits {
    fn default() -> Self {
        Self { max_dimension: 8192 }
    }
}

/// Encoder from compressed image bytes to normalized model input
#[derive(Debug, Clone, Default)]
pub struct TensorCodec {
    profile: NormalizationProfile,
    limits: DecodeLimits,
}

impl TensorCodec {
    /// Create a codec for the given profile
    pub fn new(profile: NormalizationProfile) -> Self {
        Self {
            profile,
            limits: DecodeLimits::default(),
        }
    }

    /// Override decode limits
    pub fn with_limits(mut self, limits: DecodeLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Profile this codec normalizes with
    pub fn profile(&self) -> &NormalizationProfile {
        &self.profile
    }

    /// Decode, resize and normalize image bytes into a `(1, 3, H, W)` tensor
    pub fn encode(&self, bytes: &[u8]) -> Result<Tensor, CodecError> {
        let image = self.decode(bytes)?;
        debug!(
            "Decoded {}x{} image ({:?})",
            image.width(),
            image.height(),
            image.color()
        );
        Ok(self.encode_image(&image))
    }

    /// Encode an already decoded bitmap
    pub fn encode_image(&self, image: &DynamicImage) -> Tensor {
        let profile = &self.profile;

        // Alpha is dropped and grayscale expanded to three channels
        let rgb = image.to_rgb8();

        // Direct stretch, aspect ratio is not preserved
        let resized = imageops::resize(&rgb, profile.width, profile.height, RESAMPLING_FILTER);

        let [n, c, h, w] = profile.input_shape();
        let mut input = Array4::<f32>::zeros((n, c, h, w));
        for (x, y, pixel) in resized.enumerate_pixels() {
            for channel in 0..3 {
                input[[0, channel, y as usize, x as usize]] =
                    profile.normalize(channel, pixel[channel]);
            }
        }

        Tensor::from_array(input)
    }

    fn decode(&self, bytes: &[u8]) -> Result<DynamicImage, CodecError> {
        if bytes.is_empty() {
            return Err(CodecError::Decode("empty input".to_string()));
        }

        let mut reader = ImageReader::new(Cursor::new(bytes))
            .with_guessed_format()
            .map_err(|e| CodecError::Decode(e.to_string()))?;

        if reader.format().is_none() {
            return Err(CodecError::Decode("unrecognized image format".to_string()));
        }

        let mut limits = Limits::default();
        limits.max_image_width = Some(self.limits.max_dimension);
        limits.max_image_height = Some(self.limits.max_dimension);
        reader.limits(limits);

        reader.decode().map_err(|e| CodecError::Decode(e.to_string()))
    }
}
