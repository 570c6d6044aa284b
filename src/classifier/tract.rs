use log::{debug, info, warn};
use tract_onnx::prelude::*;

use crate::acquire::ImageHandle;
use crate::classifier::labels::Labels;
use crate::classifier::postprocess::{rank, softmax};
use crate::classifier::preprocess::{letterbox, to_input, Normalization};
use crate::classifier::Classifier;
use crate::config::Config;
use crate::error::ClassifyError;
use crate::models::Prediction;

type Plan = SimplePlan<TypedFact, Box<dyn TypedOp>, TypedModel>;

/// An ONNX image classifier run through tract. The plan is built once and
/// reused for every request.
pub struct TractClassifier {
    model: Plan,
    labels: Labels,
    input_size: u32,
    normalization: Normalization,
    softmax: bool,
    top_k: usize,
}

impl TractClassifier {
    pub fn load(config: &Config) -> Result<Self, ClassifyError> {
        let labels = Labels::load(&config.labels_path)?;
        if labels.is_empty() {
            warn!(
                "Label file {} is empty; predictions will use class numbers",
                config.labels_path.display()
            );
        }
        let size = config.input_size as usize;

        let model = tract_onnx::onnx()
            .model_for_path(&config.model_path)
            .map_err(|e| model_load("Failed to load ONNX model", e))?
            .with_input_fact(0, f32::fact([1, 3, size, size]).into())
            .map_err(|e| model_load("Failed to set model input shape", e))?
            .into_optimized()
            .map_err(|e| model_load("Failed to optimize ONNX model", e))?
            .into_runnable()
            .map_err(|e| model_load("Failed to make model runnable", e))?;

        info!(
            "Loaded model {} ({} labels, input {}x{})",
            config.model_path.display(),
            labels.len(),
            size,
            size
        );

        Ok(Self {
            model,
            labels,
            input_size: config.input_size,
            normalization: Normalization {
                mean: config.mean,
                std: config.std,
            },
            softmax: config.softmax,
            top_k: config.top_k,
        })
    }

    fn scores(&self, image: &ImageHandle) -> Result<Vec<f32>, ClassifyError> {
        let boxed = letterbox(image.pixels(), self.input_size);
        let input = to_input(&boxed, &self.normalization);

        let size = self.input_size as usize;
        let tensor =
            tract_ndarray::Array4::from_shape_vec((1, 3, size, size), input.into_raw_vec())
                .map_err(|e| ClassifyError::Inference(e.to_string()))?
                .into_tensor();

        let result = self
            .model
            .run(tvec!(tensor.into()))
            .map_err(|e| ClassifyError::Inference(format!("{:#}", e)))?;

        let output = result
            .first()
            .ok_or_else(|| ClassifyError::Inference("model produced no outputs".to_string()))?
            .to_array_view::<f32>()
            .map_err(|e| ClassifyError::Inference(format!("{:#}", e)))?;
        debug!("Model output shape {:?}", output.shape());

        Ok(output.iter().copied().collect())
    }
}

impl Classifier for TractClassifier {
    fn classify(&self, image: &ImageHandle) -> Result<Vec<Prediction>, ClassifyError> {
        let raw = self.scores(image)?;
        if raw.is_empty() {
            return Err(ClassifyError::Inference(
                "model produced an empty output".to_string(),
            ));
        }

        let scores = if self.softmax { softmax(&raw) } else { raw };
        Ok(rank(&scores, &self.labels, self.top_k))
    }

    fn label_count(&self) -> usize {
        self.labels.len()
    }
}

fn model_load(context: &str, err: TractError) -> ClassifyError {
    ClassifyError::ModelLoad(format!("{}: {:#}", context, err))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn missing_labels_fail_before_model_is_read() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config {
            model_path: dir.path().join("model.onnx"),
            labels_path: dir.path().join("labels.txt"),
            ..Config::default()
        };

        let err = TractClassifier::load(&config).err().unwrap();

        assert!(matches!(err, ClassifyError::ModelLoad(ref msg) if msg.contains("labels")));
    }

    #[test]
    fn unreadable_model_is_a_model_load_error() {
        let dir = tempfile::tempdir().unwrap();
        let labels_path = dir.path().join("labels.txt");
        fs::write(&labels_path, "tabby cat\ntiger cat\n").unwrap();
        let model_path = dir.path().join("model.onnx");
        fs::write(&model_path, b"not an onnx graph").unwrap();
        let config = Config {
            model_path,
            labels_path,
            ..Config::default()
        };

        let err = TractClassifier::load(&config).err().unwrap();

        assert!(matches!(
            err,
            ClassifyError::ModelLoad(ref msg) if msg.contains("Failed to load ONNX model")
        ));
    }
}
