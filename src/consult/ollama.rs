use std::sync::Mutex;

use serde::{Deserialize, Serialize};

use super::{ConsultError, TextGenerator};

/// Ollama HTTP client for local text generation.
pub struct OllamaClient {
    base_url: String,
    model: String,
    client: reqwest::blocking::Client,
    timeout_secs: u64,
}

impl OllamaClient {
    /// Create a client for `model` on the Ollama instance at `base_url`.
    pub fn new(base_url: &str, model: &str, timeout_secs: u64) -> Result<Self, ConsultError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| ConsultError::HttpClient(e.to_string()))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            client,
            timeout_secs,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

/// Request body for Ollama /api/generate
#[derive(Serialize)]
struct OllamaGenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    system: &'a str,
    stream: bool,
}

/// Response body from Ollama /api/generate
#[derive(Deserialize)]
struct OllamaGenerateResponse {
    response: String,
}

impl TextGenerator for OllamaClient {
    fn generate(&self, prompt: &str, system: &str) -> Result<String, ConsultError> {
        if prompt.trim().is_empty() {
            return Err(ConsultError::EmptyPrompt);
        }

        let url = format!("{}/api/generate", self.base_url);
        let body = OllamaGenerateRequest {
            model: &self.model,
            prompt,
            system,
            stream: false,
        };

        let response = self.client.post(&url).json(&body).send().map_err(|e| {
            if e.is_connect() {
                ConsultError::Connection(self.base_url.clone())
            } else if e.is_timeout() {
                ConsultError::Timeout(self.timeout_secs)
            } else {
                ConsultError::HttpClient(e.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            tracing::warn!(status = status.as_u16(), model = %self.model, "Ollama returned error");
            return Err(ConsultError::Upstream {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: OllamaGenerateResponse = response
            .json()
            .map_err(|e| ConsultError::ResponseParsing(e.to_string()))?;

        Ok(parsed.response)
    }

    fn model(&self) -> &str {
        &self.model
    }
}

/// Mock generator for testing: returns a fixed response and records the last request.
pub struct MockTextGenerator {
    response: Option<String>,
    last: Mutex<Option<(String, String)>>,
}

impl MockTextGenerator {
    pub fn new(response: &str) -> Self {
        Self {
            response: Some(response.to_string()),
            last: Mutex::new(None),
        }
    }

    /// Every call fails as if the service were down.
    pub fn failing() -> Self {
        Self {
            response: None,
            last: Mutex::new(None),
        }
    }

    /// `(prompt, system)` of the most recent call.
    pub fn last_request(&self) -> Option<(String, String)> {
        self.last.lock().ok().and_then(|g| g.clone())
    }
}

impl TextGenerator for MockTextGenerator {
    fn generate(&self, prompt: &str, system: &str) -> Result<String, ConsultError> {
        if let Ok(mut last) = self.last.lock() {
            *last = Some((prompt.to_string(), system.to_string()));
        }
        self.response
            .clone()
            .ok_or_else(|| ConsultError::Connection("mock://offline".into()))
    }

    fn model(&self) -> &str {
        "mock"
    }
}
