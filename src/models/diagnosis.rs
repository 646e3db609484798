use chrono::{NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};

/// Timestamp layout used in the log and API responses (second precision).
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// One logged classification event.
///
/// Field order is the log's column order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiagnosisRecord {
    /// Generated stored name, unique within the log.
    pub filename: String,
    pub diagnosis: String,
    /// Probability of `diagnosis`, rounded to two decimals.
    pub confidence: f64,
    #[serde(with = "second_precision")]
    pub timestamp: NaiveDateTime,
    pub image_path: String,
    #[serde(default)]
    pub note: Option<String>,
}

/// Output of the diagnosis service, before the caller assigns identity and time.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Diagnosis {
    pub label: String,
    pub confidence: f64,
    pub note: Option<String>,
}

impl DiagnosisRecord {
    pub fn new(
        filename: impl Into<String>,
        diagnosis: Diagnosis,
        timestamp: NaiveDateTime,
        image_path: impl Into<String>,
    ) -> Self {
        Self {
            filename: filename.into(),
            diagnosis: diagnosis.label,
            confidence: diagnosis.confidence,
            timestamp: truncate_to_seconds(timestamp),
            image_path: image_path.into(),
            note: diagnosis.note,
        }
    }
}

pub fn truncate_to_seconds(ts: NaiveDateTime) -> NaiveDateTime {
    ts.with_nanosecond(0).unwrap_or(ts)
}

mod second_precision {
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer};

    use super::TIMESTAMP_FORMAT;

    pub fn serialize<S: Serializer>(ts: &NaiveDateTime, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&ts.format(TIMESTAMP_FORMAT).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<NaiveDateTime, D::Error> {
        let raw = String::deserialize(d)?;
        NaiveDateTime::parse_from_str(raw.trim(), TIMESTAMP_FORMAT)
            .map_err(serde::de::Error::custom)
    }
}
