//! Prompt construction for the text-generation collaborator.
//! User text is cleaned of invisible characters and role markers before it
//! is embedded in a prompt.

use super::ConsultError;

/// Longest symptom description accepted, in characters.
pub const MAX_SYMPTOMS_CHARS: usize = 2000;

/// Longest diagnosis label accepted for explanation, in characters.
pub const MAX_DIAGNOSIS_CHARS: usize = 200;

pub const CONSULT_SYSTEM_PROMPT: &str = "You are a highly experienced medical assistant. \
You give cautious, general guidance and never replace an examination by a licensed physician.";

pub const RADIOLOGY_SYSTEM_PROMPT: &str =
    "You are a helpful medical assistant specialized in radiology.";

/// Build the consultation prompt for free-text symptoms.
pub fn symptom_prompt(symptoms: &str) -> Result<String, ConsultError> {
    let symptoms = clean_user_text(symptoms, MAX_SYMPTOMS_CHARS)?;
    Ok(format!(
        "A user reports the following symptoms:\n\
         \n\
         \"{symptoms}\"\n\
         \n\
         Based on this, provide:\n\
         1. The most likely diagnosis.\n\
         2. Recommended medical tests or imaging.\n\
         3. Initial care advice (home care if appropriate).\n\
         \n\
         Always remind the user to consult a licensed physician for a proper examination.\n\
         Be concise, professional, and easy to understand (3-5 sentences max)."
    ))
}

/// Build the explanation prompt for a diagnosis label.
pub fn explanation_prompt(diagnosis: &str) -> Result<String, ConsultError> {
    let label = clean_user_text(diagnosis, MAX_DIAGNOSIS_CHARS)?;
    Ok(format!(
        "Explain why a chest X-ray might be diagnosed as \"{label}\".\n\
         Use professional radiology reasoning. Keep the explanation concise (2-3 sentences)."
    ))
}

/// Diagnosis label as it appears in logs: cleaned, single line.
pub(crate) fn prompt_label(diagnosis: &str) -> String {
    strip_invisible(diagnosis).trim().replace('\n', " ")
}

/// Trim, drop invisible characters and role-marker lines, enforce `max` chars.
///
/// Length is checked after cleaning, so padding cannot push valid text over
/// the limit.
fn clean_user_text(raw: &str, max: usize) -> Result<String, ConsultError> {
    let visible = strip_invisible(raw);
    let kept: Vec<&str> = visible
        .lines()
        .filter(|line| {
            let lower = line.trim().to_lowercase();
            if is_role_marker(&lower) {
                tracing::warn!("Role marker removed from user input");
                false
            } else {
                true
            }
        })
        .collect();

    let cleaned = kept.join("\n").trim().to_string();
    if cleaned.is_empty() {
        return Err(ConsultError::EmptyPrompt);
    }
    if cleaned.chars().count() > max {
        return Err(ConsultError::InputTooLong { max });
    }
    Ok(cleaned)
}

fn strip_invisible(text: &str) -> String {
    text.chars()
        .filter(|c| {
            if matches!(*c, ' ' | '\n' | '\t') {
                return true;
            }
            !matches!(
                *c,
                '\u{200B}'..='\u{200F}' | '\u{202A}'..='\u{202E}' | '\u{2060}'..='\u{2064}' | '\u{FEFF}'
            ) && !c.is_control()
        })
        .collect()
}

fn is_role_marker(lower: &str) -> bool {
    ["system:", "assistant:", "user:", "[system]", "[inst]", "[/inst]", "<<sys>>"]
        .iter()
        .any(|m| lower.starts_with(m))
}
