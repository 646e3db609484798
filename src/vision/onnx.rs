//! ONNX Runtime classifier, behind the `onnx-classifier` feature.
//!
//! Expects a single-input model taking `[1, 3, 224, 224]` ImageNet-normalized
//! RGB and producing `[1, num_labels]` logits.

use std::path::Path;
use std::sync::Mutex;

use image::RgbImage;
use ort::session::Session;

use super::{
    to_input_tensor, Activation, ClassifierOutput, ImageClassifier, LabelSet, VisionError,
    INPUT_SIZE,
};

/// Pretrained vision model (e.g. DenseNet-121 CheXNet head) run through ONNX Runtime.
///
/// `ort::Session::run` needs `&mut self`; the Mutex keeps the trait `&self`
/// and serializes forward passes.
pub struct OnnxClassifier {
    session: Mutex<Session>,
    label_set: LabelSet,
}

impl OnnxClassifier {
    pub fn load(model_path: &Path, label_set: LabelSet) -> Result<Self, VisionError> {
        if !model_path.exists() {
            return Err(VisionError::ModelNotFound(model_path.to_path_buf()));
        }

        let session = Session::builder()
            .map_err(|e: ort::Error| VisionError::ModelInit(e.to_string()))?
            .with_intra_threads(2)
            .map_err(|e: ort::Error| VisionError::ModelInit(e.to_string()))?
            .commit_from_file(model_path)
            .map_err(|e: ort::Error| VisionError::ModelInit(format!("ONNX load failed: {e}")))?;

        tracing::info!(
            model = %model_path.display(),
            labels = label_set.as_str(),
            "ONNX classifier loaded"
        );

        Ok(Self {
            session: Mutex::new(session),
            label_set,
        })
    }
}

impl ImageClassifier for OnnxClassifier {
    fn labels(&self) -> &[&'static str] {
        self.label_set.labels()
    }

    fn classify(&self, image: &RgbImage) -> Result<ClassifierOutput, VisionError> {
        use ort::value::TensorRef;

        let side = INPUT_SIZE as usize;
        let input = ndarray::Array4::from_shape_vec((1, 3, side, side), to_input_tensor(image))
            .map_err(|e| VisionError::Classification(e.to_string()))?;
        let tensor = TensorRef::from_array_view(&input)
            .map_err(|e| VisionError::Classification(e.to_string()))?;

        let mut session = self
            .session
            .lock()
            .map_err(|_| VisionError::Classification("Session lock poisoned".to_string()))?;

        let outputs = session
            .run(ort::inputs![tensor])
            .map_err(|e| VisionError::Classification(format!("ONNX inference failed: {e}")))?;

        let (shape, data) = outputs[0]
            .try_extract_tensor::<f32>()
            .map_err(|e| VisionError::Classification(format!("Output extraction: {e}")))?;

        let expected = self.labels().len();
        if data.len() != expected {
            return Err(VisionError::Classification(format!(
                "Unexpected output shape: {shape:?}, expected [1, {expected}]"
            )));
        }

        let activation = match self.label_set {
            LabelSet::ChexNet => Activation::Sigmoid,
            LabelSet::Triage => Activation::Softmax,
        };

        Ok(ClassifierOutput::Logits {
            values: data.to_vec(),
            activation,
        })
    }

    fn name(&self) -> &str {
        "onnx"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_model_file_is_reported() {
        let result = OnnxClassifier::load(Path::new("/nonexistent/model.onnx"), LabelSet::ChexNet);
        assert!(matches!(result, Err(VisionError::ModelNotFound(_))));
    }
}
