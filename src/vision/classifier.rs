use image::RgbImage;

use super::VisionError;

/// How raw logits become per-label probabilities.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Activation {
    /// Independent per-label probabilities (multi-label heads).
    Sigmoid,
    /// One distribution across all labels (multi-class heads).
    Softmax,
}

/// Raw classifier output, in the classifier's label order.
#[derive(Debug, Clone, PartialEq)]
pub enum ClassifierOutput {
    Probabilities(Vec<f32>),
    Logits {
        values: Vec<f32>,
        activation: Activation,
    },
}

/// A pretrained image model treated as a black box.
///
/// Implementations must be deterministic for identical input (eval mode).
pub trait ImageClassifier: Send + Sync {
    /// Fixed label order the output indexes into.
    fn labels(&self) -> &[&'static str];

    fn classify(&self, image: &RgbImage) -> Result<ClassifierOutput, VisionError>;

    /// Short identifier for health reporting and logs.
    fn name(&self) -> &str;
}

/// Mock classifier for testing: returns configured scores or a forced failure.
pub struct MockClassifier {
    labels: Vec<&'static str>,
    output: Result<ClassifierOutput, String>,
}

impl MockClassifier {
    pub fn new(labels: &[&'static str], probabilities: Vec<f32>) -> Self {
        Self {
            labels: labels.to_vec(),
            output: Ok(ClassifierOutput::Probabilities(probabilities)),
        }
    }

    pub fn with_logits(labels: &[&'static str], values: Vec<f32>, activation: Activation) -> Self {
        Self {
            labels: labels.to_vec(),
            output: Ok(ClassifierOutput::Logits { values, activation }),
        }
    }

    /// A classifier whose every invocation fails, e.g. device unavailable.
    pub fn failing(labels: &[&'static str], reason: &str) -> Self {
        Self {
            labels: labels.to_vec(),
            output: Err(reason.to_string()),
        }
    }
}

impl ImageClassifier for MockClassifier {
    fn labels(&self) -> &[&'static str] {
        &self.labels
    }

    fn classify(&self, _image: &RgbImage) -> Result<ClassifierOutput, VisionError> {
        self.output
            .clone()
            .map_err(VisionError::Classification)
    }

    fn name(&self) -> &str {
        "mock"
    }
}
