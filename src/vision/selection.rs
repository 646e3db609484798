//! Top-1 label selection.
//!
//! Confidence is always the probability of the selected label, so it can
//! be reproduced from the same raw output. Ties go to the lowest index.

use super::{Activation, ClassifierOutput, VisionError};

/// The winning label of one classification.
#[derive(Debug, Clone, PartialEq)]
pub struct TopPrediction {
    pub index: usize,
    pub label: &'static str,
    /// Unrounded probability in [0, 1].
    pub probability: f32,
}

/// Convert raw classifier output into per-label probabilities.
pub fn to_probabilities(output: &ClassifierOutput) -> Vec<f32> {
    match output {
        ClassifierOutput::Probabilities(p) => p.clone(),
        ClassifierOutput::Logits {
            values,
            activation: Activation::Sigmoid,
        } => values.iter().map(|&x| sigmoid(x)).collect(),
        ClassifierOutput::Logits {
            values,
            activation: Activation::Softmax,
        } => softmax(values),
    }
}

pub fn sigmoid(x: f32) -> f32 {
    1.0 / (1.0 + (-x).exp())
}

/// Numerically stable softmax. Non-finite inputs get zero mass.
pub fn softmax(values: &[f32]) -> Vec<f32> {
    let max = values
        .iter()
        .copied()
        .filter(|v| v.is_finite())
        .fold(f32::NEG_INFINITY, f32::max);
    if !max.is_finite() {
        return vec![0.0; values.len()];
    }
    let exps: Vec<f32> = values
        .iter()
        .map(|&v| if v.is_finite() { (v - max).exp() } else { 0.0 })
        .collect();
    let sum: f32 = exps.iter().sum();
    exps.into_iter().map(|e| e / sum).collect()
}

/// Index and value of the highest finite score; first occurrence wins ties.
pub fn argmax(scores: &[f32]) -> Option<(usize, f32)> {
    let mut best: Option<(usize, f32)> = None;
    for (i, &score) in scores.iter().enumerate() {
        if !score.is_finite() {
            continue;
        }
        match best {
            Some((_, current)) if score <= current => {}
            _ => best = Some((i, score)),
        }
    }
    best
}

/// Apply the top-1 policy to a classifier's output.
pub fn select_top1(
    labels: &[&'static str],
    output: &ClassifierOutput,
) -> Result<TopPrediction, VisionError> {
    let probabilities = to_probabilities(output);
    if probabilities.len() != labels.len() {
        return Err(VisionError::Classification(format!(
            "classifier returned {} scores for {} labels",
            probabilities.len(),
            labels.len()
        )));
    }

    let (index, probability) = argmax(&probabilities).ok_or_else(|| {
        VisionError::Classification("classifier returned no finite scores".into())
    })?;

    Ok(TopPrediction {
        index,
        label: labels[index],
        probability: probability.clamp(0.0, 1.0),
    })
}

/// Round a probability to two decimals for presentation.
pub fn round_confidence(probability: f32) -> f64 {
    let p = f64::from(probability.clamp(0.0, 1.0));
    (p * 100.0).round() / 100.0
}
