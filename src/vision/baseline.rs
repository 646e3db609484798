//! Deterministic, model-free classifier.
//!
//! Scores each label with a fixed linear function of global luminance
//! statistics. It lets the service run end to end without model weights;
//! its output carries no clinical meaning.

use image::RgbImage;

use super::{
    image_stats, Activation, ClassifierOutput, ImageClassifier, LabelSet, VisionError,
};

pub struct BaselineClassifier {
    label_set: LabelSet,
    /// Per label: `[bias, mean, std_dev, edge_energy]`.
    weights: Vec<[f32; 4]>,
}

impl BaselineClassifier {
    pub fn new(label_set: LabelSet) -> Self {
        let weights = (0..label_set.labels().len()).map(label_weights).collect();
        Self { label_set, weights }
    }

    fn activation(&self) -> Activation {
        match self.label_set {
            LabelSet::ChexNet => Activation::Sigmoid,
            LabelSet::Triage => Activation::Softmax,
        }
    }
}

/// Fixed, index-derived weights. Biases are strictly decreasing so a
/// featureless image has a unique winner.
fn label_weights(i: usize) -> [f32; 4] {
    let i = i as f32;
    [
        -1.0 - 0.05 * i,
        ((i * 7.0) % 5.0 - 2.0) * 0.6,
        ((i * 3.0) % 4.0 - 1.5) * 0.8,
        ((i * 5.0) % 3.0 - 1.0) * 1.2,
    ]
}

impl ImageClassifier for BaselineClassifier {
    fn labels(&self) -> &[&'static str] {
        self.label_set.labels()
    }

    fn classify(&self, image: &RgbImage) -> Result<ClassifierOutput, VisionError> {
        let (w, h) = image.dimensions();
        if w == 0 || h == 0 {
            return Err(VisionError::InvalidImage("image has no pixels".into()));
        }

        let stats = image_stats(image);
        let features = [1.0, stats.mean, stats.std_dev, stats.edge_energy];
        let values: Vec<f32> = self
            .weights
            .iter()
            .map(|w| w.iter().zip(features.iter()).map(|(a, b)| a * b).sum::<f32>())
            .collect();

        Ok(ClassifierOutput::Logits {
            values,
            activation: self.activation(),
        })
    }

    fn name(&self) -> &str {
        match self.label_set {
            LabelSet::ChexNet => "baseline-chexnet",
            LabelSet::Triage => "baseline-triage",
        }
    }
}
