//! Diagnosis pipeline: store the upload, classify it, record the result.
//!
//! Data flow: raw bytes → `FileStore` → `DiagnosisService` → `DiagnosisLog`.
//! Only `FileStore` and `DiagnosisLog` touch the upload directory and the
//! log file.

pub mod csv_log;
pub mod file_store;
pub mod log;
pub mod pipeline;
pub mod service;

pub use csv_log::CsvDiagnosisLog;
pub use file_store::{FileStore, StoredImage, UploadHints};
pub use log::{ClearSummary, DiagnosisLog, ImageCleanup, MemoryDiagnosisLog};
pub use pipeline::{DiagnosisOutcome, DiagnosisPipeline};
pub use service::DiagnosisService;

use thiserror::Error;

use crate::vision::VisionError;

#[derive(Error, Debug)]
pub enum DiagnosisError {
    #[error("Storage error: {0}")]
    Storage(#[from] std::io::Error),

    #[error("Upload is empty")]
    EmptyUpload,

    #[error("Invalid image file: {0}")]
    InvalidImage(String),

    #[error("Classification failed: {0}")]
    Classification(String),

    #[error("Diagnosis log error: {0}")]
    Log(String),

    #[error("Diagnosis log lock poisoned")]
    LockPoisoned,
}

impl From<VisionError> for DiagnosisError {
    fn from(err: VisionError) -> Self {
        match err {
            VisionError::InvalidImage(msg) => DiagnosisError::InvalidImage(msg),
            VisionError::Io(e) => DiagnosisError::Storage(e),
            other => DiagnosisError::Classification(other.to_string()),
        }
    }
}

impl From<csv::Error> for DiagnosisError {
    fn from(err: csv::Error) -> Self {
        DiagnosisError::Log(err.to_string())
    }
}
