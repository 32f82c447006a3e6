//! Model input tensor

use ndarray::Array4;

use crate::NormalizationProfile;

/// Dense `(1, 3, H, W)` f32 tensor in channel-first layout
#[derive(Debug, Clone, PartialEq)]
pub struct Tensor {
    data: Array4<f32>,
}

impl Tensor {
    /// Wrap an existing array
    pub fn from_array(data: Array4<f32>) -> Self {
        Self { data }
    }

    /// All-zero tensor with the profile's input shape, used for warm-up runs
    pub fn zeros(profile: &NormalizationProfile) -> Self {
        let [n, c, h, w] = profile.input_shape();
        Self {
            data: Array4::zeros((n, c, h, w)),
        }
    }

    /// Tensor shape as `[batch, channels, height, width]`
    pub fn shape(&self) -> [usize; 4] {
        let dim = self.data.dim();
        [dim.0, dim.1, dim.2, dim.3]
    }

    /// Contiguous row-major view of the elements, if the layout allows it
    pub fn as_slice(&self) -> Option<&[f32]> {
        self.data.as_slice()
    }

    /// Underlying array
    pub fn as_array(&self) -> &Array4<f32> {
        &self.data
    }

    /// Whether every element is a finite number
    pub fn is_finite(&self) -> bool {
        self.data.iter().all(|v| v.is_finite())
    }
}
