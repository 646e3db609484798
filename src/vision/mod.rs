//! Chest X-ray classification seam.
//!
//! The classifier itself is a collaborator: anything implementing
//! `ImageClassifier` can back the diagnosis service. This module owns
//! what sits around it: decoding, tensor preparation, label tables,
//! and the top-1 selection policy.

pub mod baseline;
pub mod classifier;
pub mod labels;
#[cfg(feature = "onnx-classifier")]
pub mod onnx;
pub mod preprocess;
pub mod selection;

pub use baseline::BaselineClassifier;
pub use classifier::*;
pub use labels::*;
#[cfg(feature = "onnx-classifier")]
pub use onnx::OnnxClassifier;
pub use preprocess::*;
pub use selection::*;

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum VisionError {
    #[error("Image could not be decoded: {0}")]
    InvalidImage(String),

    #[error("Classifier failed: {0}")]
    Classification(String),

    #[error("Classifier model not found: {0}")]
    ModelNotFound(PathBuf),

    #[error("Classifier initialization: {0}")]
    ModelInit(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
