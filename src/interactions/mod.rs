//! Pairwise drug interaction scoring over a fixed interaction graph.

pub mod graph;

pub use graph::*;

use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum InteractionError {
    #[error("Unknown drug: {0}")]
    UnknownDrug(String),
}

/// Result of scoring one pair of drugs.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InteractionAssessment {
    pub drug_a: String,
    pub drug_b: String,
    /// Known direct interaction between the two.
    pub interaction: bool,
    /// 0.0 (no signal) ..= 1.0 (known interaction).
    pub risk: f64,
    pub same_drug: bool,
    pub message: String,
}

pub trait InteractionScorer: Send + Sync {
    fn score(&self, drug_a: &str, drug_b: &str) -> Result<InteractionAssessment, InteractionError>;

    /// Canonical names of every drug the scorer knows.
    fn known_drugs(&self) -> Vec<String>;
}
