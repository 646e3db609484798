use std::path::Path;
use std::sync::Arc;

use super::DiagnosisError;
use crate::models::Diagnosis;
use crate::vision::{decode_rgb, note_for, round_confidence, select_top1, ImageClassifier};

/// Wraps an `ImageClassifier` with decoding and the top-1 label policy.
pub struct DiagnosisService {
    classifier: Arc<dyn ImageClassifier>,
    attach_notes: bool,
}

impl DiagnosisService {
    pub fn new(classifier: Arc<dyn ImageClassifier>) -> Self {
        Self {
            classifier,
            attach_notes: false,
        }
    }

    /// Attach the static interpretation note for the chosen label.
    pub fn with_notes(mut self, enabled: bool) -> Self {
        self.attach_notes = enabled;
        self
    }

    pub fn classifier_name(&self) -> &str {
        self.classifier.name()
    }

    pub fn labels(&self) -> &[&'static str] {
        self.classifier.labels()
    }

    /// Classify the image stored at `image_path`.
    ///
    /// Undecodable bytes are `InvalidImage`; anything the classifier
    /// itself reports is `Classification`. Neither touches the log.
    pub fn diagnose(&self, image_path: &Path) -> Result<Diagnosis, DiagnosisError> {
        let started = std::time::Instant::now();
        let image = decode_rgb(image_path)?;

        let output = self.classifier.classify(&image).map_err(|e| {
            tracing::warn!(classifier = self.classifier.name(), error = %e, "Classifier invocation failed");
            DiagnosisError::from(e)
        })?;

        let top = select_top1(self.classifier.labels(), &output)?;
        let confidence = round_confidence(top.probability);

        tracing::info!(
            label = top.label,
            confidence,
            classifier = self.classifier.name(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Image classified"
        );

        Ok(Diagnosis {
            label: top.label.to_string(),
            confidence,
            note: self.attach_notes.then(|| note_for(top.label).to_string()),
        })
    }
}
