//! Process-wide application state shared by every request handler.

use std::sync::Arc;
use std::time::Instant;

use crate::config::AppConfig;
use crate::consult::{ConsultError, OllamaClient, TextGenerator};
use crate::diagnosis::{
    CsvDiagnosisLog, DiagnosisLog, DiagnosisPipeline, DiagnosisService, FileStore,
};
use crate::interactions::{GraphInteractionScorer, InteractionScorer};
use crate::vision::{BaselineClassifier, ImageClassifier, LabelSet};

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Text generation client: {0}")]
    Consult(#[from] ConsultError),
}

// ═══════════════════════════════════════════════════════════
// CoreState
// ═══════════════════════════════════════════════════════════

/// Wrapped in `Arc` at startup; handlers only read it.
pub struct CoreState {
    pub config: AppConfig,
    pipeline: Arc<DiagnosisPipeline>,
    generator: Arc<dyn TextGenerator>,
    scorer: Arc<dyn InteractionScorer>,
    started: Instant,
}

impl CoreState {
    /// Assemble state from explicit collaborators.
    pub fn new(
        config: AppConfig,
        classifier: Arc<dyn ImageClassifier>,
        log: Arc<dyn DiagnosisLog>,
        generator: Arc<dyn TextGenerator>,
        scorer: Arc<dyn InteractionScorer>,
    ) -> Self {
        let service = DiagnosisService::new(classifier)
            .with_notes(config.label_set == LabelSet::Triage);
        let pipeline = DiagnosisPipeline::new(FileStore::new(&config.upload_dir), service, log);

        Self {
            config,
            pipeline: Arc::new(pipeline),
            generator,
            scorer,
            started: Instant::now(),
        }
    }

    /// Production wiring: CSV log, Ollama client, graph scorer, and the
    /// configured classifier.
    ///
    /// Builds a blocking HTTP client, so call it from a blocking context.
    pub fn from_config(config: AppConfig) -> Result<Self, CoreError> {
        let classifier = build_classifier(&config);
        let log: Arc<dyn DiagnosisLog> = Arc::new(CsvDiagnosisLog::new(&config.log_file));
        let generator: Arc<dyn TextGenerator> = Arc::new(OllamaClient::new(
            &config.ollama_url,
            &config.ollama_model,
            config.llm_timeout_secs,
        )?);
        let scorer: Arc<dyn InteractionScorer> = Arc::new(GraphInteractionScorer::default());

        tracing::info!(
            classifier = classifier.name(),
            upload_dir = %config.upload_dir.display(),
            log_file = %config.log_file.display(),
            ollama = %config.ollama_url,
            model = %config.ollama_model,
            "Core state initialized"
        );

        Ok(Self::new(config, classifier, log, generator, scorer))
    }

    pub fn pipeline(&self) -> &Arc<DiagnosisPipeline> {
        &self.pipeline
    }

    pub fn log(&self) -> &Arc<dyn DiagnosisLog> {
        self.pipeline.log()
    }

    pub fn generator(&self) -> &Arc<dyn TextGenerator> {
        &self.generator
    }

    pub fn scorer(&self) -> &Arc<dyn InteractionScorer> {
        &self.scorer
    }

    pub fn uptime_secs(&self) -> u64 {
        self.started.elapsed().as_secs()
    }
}

/// ONNX model when compiled in and configured; baseline otherwise.
/// A model that fails to load falls back to the baseline with a warning.
fn build_classifier(config: &AppConfig) -> Arc<dyn ImageClassifier> {
    #[cfg(feature = "onnx-classifier")]
    if let Some(path) = &config.classifier_model {
        match crate::vision::OnnxClassifier::load(path, config.label_set) {
            Ok(c) => return Arc::new(c),
            Err(e) => tracing::warn!(
                model = %path.display(),
                error = %e,
                "ONNX classifier unavailable, using baseline"
            ),
        }
    }

    #[cfg(not(feature = "onnx-classifier"))]
    if let Some(path) = &config.classifier_model {
        tracing::warn!(
            model = %path.display(),
            "CLASSIFIER_MODEL ignored: built without the onnx-classifier feature"
        );
    }

    Arc::new(BaselineClassifier::new(config.label_set))
}
