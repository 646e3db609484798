use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;

use crate::vision::LabelSet;

/// Application-level constants
pub const APP_NAME: &str = "MedAssist";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

const DEFAULT_UPLOAD_DIR: &str = "data/uploads";
const DEFAULT_LOG_FILE: &str = "data/diagnosis_log.csv";
const DEFAULT_PORT: u16 = 8000;
const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";
const DEFAULT_OLLAMA_MODEL: &str = "medgemma";
const DEFAULT_LLM_TIMEOUT_SECS: u64 = 60;
/// 20 MB. Chest radiographs exported as PNG rarely exceed a few MB.
const DEFAULT_MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;

/// Default tracing filter when `RUST_LOG` is not set.
pub fn default_log_filter() -> &'static str {
    "medassist=info,medassist_lib=info,tower_http=info"
}

/// Runtime configuration, read once at startup.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub upload_dir: PathBuf,
    pub log_file: PathBuf,
    pub host: IpAddr,
    pub port: u16,
    pub ollama_url: String,
    pub ollama_model: String,
    pub llm_timeout_secs: u64,
    pub classifier_model: Option<PathBuf>,
    pub label_set: LabelSet,
    pub max_upload_bytes: usize,
    /// Empty means any origin.
    pub cors_origins: Vec<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            upload_dir: PathBuf::from(DEFAULT_UPLOAD_DIR),
            log_file: PathBuf::from(DEFAULT_LOG_FILE),
            host: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: DEFAULT_PORT,
            ollama_url: DEFAULT_OLLAMA_URL.to_string(),
            ollama_model: DEFAULT_OLLAMA_MODEL.to_string(),
            llm_timeout_secs: DEFAULT_LLM_TIMEOUT_SECS,
            classifier_model: None,
            label_set: LabelSet::ChexNet,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            cors_origins: Vec::new(),
        }
    }
}

impl AppConfig {
    /// Build the configuration from process environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup.
    ///
    /// Malformed values are logged and replaced by their default; startup never fails here.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let upload_dir = get("UPLOAD_DIR").map(PathBuf::from).unwrap_or(defaults.upload_dir);
        let log_file = get("LOG_FILE").map(PathBuf::from).unwrap_or(defaults.log_file);
        let host = parse_or_default(get("HOST"), "HOST", defaults.host);
        let port = parse_or_default(get("PORT"), "PORT", defaults.port);
        let ollama_url = get("OLLAMA_URL").unwrap_or(defaults.ollama_url);
        let ollama_model = get("OLLAMA_MODEL").unwrap_or(defaults.ollama_model);
        let llm_timeout_secs =
            parse_or_default(get("LLM_TIMEOUT_SECS"), "LLM_TIMEOUT_SECS", defaults.llm_timeout_secs);
        let classifier_model = get("CLASSIFIER_MODEL").map(PathBuf::from);
        let label_set = match get("CLASSIFIER_LABELS") {
            Some(raw) => LabelSet::parse(&raw).unwrap_or_else(|| {
                tracing::warn!(value = %raw, "Unknown CLASSIFIER_LABELS, using default");
                defaults.label_set
            }),
            None => defaults.label_set,
        };
        let max_upload_bytes =
            parse_or_default(get("MAX_UPLOAD_BYTES"), "MAX_UPLOAD_BYTES", defaults.max_upload_bytes);
        let cors_origins = get("CORS_ORIGINS")
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|o| !o.is_empty() && *o != "*")
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default();

        Self {
            upload_dir,
            log_file,
            host,
            port,
            ollama_url,
            ollama_model,
            llm_timeout_secs,
            classifier_model,
            label_set,
            max_upload_bytes,
            cors_origins,
        }
    }

    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

fn parse_or_default<T>(raw: Option<String>, key: &str, default: T) -> T
where
    T: std::str::FromStr + std::fmt::Display,
{
    match raw {
        Some(value) => value.parse().unwrap_or_else(|_| {
            tracing::warn!(key, value = %value, fallback = %default, "Invalid config value");
            default
        }),
        None => default,
    }
}
