use serde::{Deserialize, Serialize};

/// NIH ChestX-ray14 findings, in model output order.
pub const CHEXNET_LABELS: &[&str] = &[
    "Atelectasis",
    "Cardiomegaly",
    "Effusion",
    "Infiltration",
    "Mass",
    "Nodule",
    "Pneumonia",
    "Pneumothorax",
    "Consolidation",
    "Edema",
    "Emphysema",
    "Fibrosis",
    "Pleural_Thickening",
    "Hernia",
];

/// Five-way triage head used by the lightweight model variant.
pub const TRIAGE_LABELS: &[&str] = &["Pneumonia", "No Finding", "Effusion", "Infiltration", "Edema"];

const FALLBACK_NOTE: &str = "Unclear findings. Further evaluation recommended.";

/// Static interpretation notes, keyed by label.
const NOTES: &[(&str, &str)] = &[
    (
        "Pneumonia",
        "X-ray suggests pneumonia. Recommend antibiotics and follow-up imaging.",
    ),
    (
        "No Finding",
        "No abnormalities observed. Imaging appears normal.",
    ),
    (
        "Effusion",
        "Possible pleural effusion. Recommend thoracic ultrasound or CT for confirmation.",
    ),
    (
        "Infiltration",
        "Infiltrates detected. Consider infectious or neoplastic causes.",
    ),
    (
        "Edema",
        "Signs of pulmonary edema. Recommend correlation with cardiac function.",
    ),
];

/// Which label vocabulary a classifier emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LabelSet {
    /// 14 independent findings, sigmoid outputs.
    ChexNet,
    /// 5 mutually exclusive classes, softmax outputs.
    Triage,
}

impl LabelSet {
    pub fn labels(&self) -> &'static [&'static str] {
        match self {
            LabelSet::ChexNet => CHEXNET_LABELS,
            LabelSet::Triage => TRIAGE_LABELS,
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "chexnet" | "chestxray14" => Some(LabelSet::ChexNet),
            "triage" | "vit" => Some(LabelSet::Triage),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LabelSet::ChexNet => "chexnet",
            LabelSet::Triage => "triage",
        }
    }
}

/// Short interpretation note for a label. Pure lookup, no external call.
pub fn note_for(label: &str) -> &'static str {
    NOTES
        .iter()
        .find(|(l, _)| *l == label)
        .map(|(_, note)| *note)
        .unwrap_or(FALLBACK_NOTE)
}
