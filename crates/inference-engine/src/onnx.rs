//! ONNX backend using tract

use std::path::Path;

use tensor_codec::{NormalizationProfile, Tensor};
use tract_onnx::prelude::{
    tvec, Datum, Framework, InferenceFact, InferenceModelExt, TractResult, TypedModel,
    TypedRunnableModel,
};
use tracing::{debug, info};

use crate::backend::Backend;
use crate::InferenceError;

type Plan = TypedRunnableModel<TypedModel>;

/// ONNX model compiled to a tract execution plan.
///
/// The plan is immutable after loading. Every `run` builds its own execution
/// state, so concurrent calls do not share mutable data.
pub struct OnnxBackend {
    plan: Plan,
    output_name: String,
}

impl OnnxBackend {
    /// Load and optimize a model with its single input fixed to the profile's shape
    pub fn load(
        path: impl AsRef<Path>,
        profile: &NormalizationProfile,
    ) -> Result<Self, InferenceError> {
        let path = path.as_ref();
        info!("Loading ONNX model from {}", path.display());

        let plan = build_plan(path, profile.input_shape())
            .map_err(|e| InferenceError::ModelLoadError(format!("{}: {}", path.display(), e)))?;

        let model = plan.model();
        if model.inputs.len() != 1 || model.outputs.len() != 1 {
            return Err(InferenceError::ModelLoadError(format!(
                "expected exactly one input and one output, found {} and {}",
                model.inputs.len(),
                model.outputs.len()
            )));
        }

        let input_name = model.node(model.inputs[0].node).name.clone();
        let output_name = model.node(model.outputs[0].node).name.clone();
        info!(
            "Model loaded: input '{}' {:?}, output '{}'",
            input_name,
            profile.input_shape(),
            output_name
        );

        Ok(Self { plan, output_name })
    }
}

fn build_plan(path: &Path, shape: [usize; 4]) -> TractResult<Plan> {
    let fact = InferenceFact::dt_shape(
        f32::datum_type(),
        tvec!(shape[0], shape[1], shape[2], shape[3]),
    );
    tract_onnx::onnx()
        .model_for_path(path)?
        .with_input_fact(0, fact)?
        .into_optimized()?
        .into_runnable()
}

impl Backend for OnnxBackend {
    fn name(&self) -> &str {
        "onnx"
    }

    fn run(&self, input: &Tensor) -> Result<Vec<f32>, InferenceError> {
        let data = input.as_slice().ok_or_else(|| {
            InferenceError::InferenceFailed("input tensor is not contiguous".to_string())
        })?;

        let tensor = tract_onnx::prelude::Tensor::from_shape(&input.shape(), data)
            .map_err(|e| InferenceError::InferenceFailed(e.to_string()))?;

        let outputs = self
            .plan
            .run(tvec!(tensor.into()))
            .map_err(|e| InferenceError::InferenceFailed(e.to_string()))?;

        let output = outputs.first().ok_or_else(|| {
            InferenceError::InferenceFailed("model produced no output".to_string())
        })?;
        debug!("Output '{}' shape {:?}", self.output_name, output.shape());

        let scores = output
            .as_slice::<f32>()
            .map_err(|e| InferenceError::InferenceFailed(e.to_string()))?;

        Ok(scores.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_model_file() {
        let result = OnnxBackend::load("does/not/exist.onnx", &NormalizationProfile::default());
        assert!(matches!(result, Err(InferenceError::ModelLoadError(_))));
    }

    #[test]
    fn test_corrupted_model_file() {
        let path = std::env::temp_dir().join(format!("corrupted-{}.onnx", std::process::id()));
        std::fs::write(&path, b"definitely not a protobuf graph").unwrap();

        let result = OnnxBackend::load(&path, &NormalizationProfile::default());
        std::fs::remove_file(&path).ok();

        assert!(matches!(result, Err(InferenceError::ModelLoadError(_))));
    }
}
