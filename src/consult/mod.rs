//! Text-generation collaborator for symptom consultation and diagnosis
//! explanation.

pub mod ollama;
pub mod prompt;

pub use ollama::*;
pub use prompt::*;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConsultError {
    #[error("Text generation service is not reachable at {0}")]
    Connection(String),

    #[error("Text generation timed out after {0}s")]
    Timeout(u64),

    #[error("Text generation service returned error (status {status}): {body}")]
    Upstream { status: u16, body: String },

    #[error("Response parsing error: {0}")]
    ResponseParsing(String),

    #[error("HTTP client error: {0}")]
    HttpClient(String),

    #[error("Input is empty")]
    EmptyPrompt,

    #[error("Input exceeds {max} characters")]
    InputTooLong { max: usize },
}

impl ConsultError {
    /// Caller-side problem, as opposed to an unavailable upstream.
    pub fn is_invalid_input(&self) -> bool {
        matches!(self, ConsultError::EmptyPrompt | ConsultError::InputTooLong { .. })
    }
}

/// Prompt in, text out. Implementations block the calling thread.
pub trait TextGenerator: Send + Sync {
    fn generate(&self, prompt: &str, system: &str) -> Result<String, ConsultError>;

    /// Model identifier, for health reporting.
    fn model(&self) -> &str;
}

/// Likely diagnosis, tests, and initial care advice for free-text symptoms.
pub fn consult_symptoms(
    generator: &dyn TextGenerator,
    symptoms: &str,
) -> Result<String, ConsultError> {
    let prompt = symptom_prompt(symptoms)?;
    let started = std::time::Instant::now();
    let text = generator.generate(&prompt, CONSULT_SYSTEM_PROMPT)?;
    tracing::info!(
        model = generator.model(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "Symptom consultation generated"
    );
    Ok(text.trim().to_string())
}

/// Short radiology explanation for a diagnosis label.
pub fn explain_diagnosis(
    generator: &dyn TextGenerator,
    diagnosis: &str,
) -> Result<String, ConsultError> {
    let prompt = explanation_prompt(diagnosis)?;
    let started = std::time::Instant::now();
    let text = generator.generate(&prompt, RADIOLOGY_SYSTEM_PROMPT)?;
    tracing::info!(
        model = generator.model(),
        diagnosis = %prompt_label(diagnosis),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "Diagnosis explanation generated"
    );
    Ok(text.trim().to_string())
}
