//! Biometric records, as they travel through the shared file.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ProbeError;

/// One biometric event.
///
/// Serialized as a flat JSON object with a `type` tag:
///
/// ```
/// use biometrics_probe::Record;
/// let line = serde_json::to_string(&Record::HeartRate { heart_rate: 72 }).unwrap();
/// assert_eq!(line, r#"{"type":"heart_rate","heart_rate":72}"#);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Record {
    HeartRate {
        heart_rate: u32,
    },
    Steps {
        steps: u32,
    },
    Diet {
        calories: u32,
        carbs: u32,
        protein: u32,
        fat: u32,
    },
    Exercise {
        /// minutes
        exercise_duration: u32,
        /// miles
        exercise_distance: f64,
    },
}

impl Record {
    pub fn kind(&self) -> RecordKind {
        match self {
            Record::HeartRate { .. } => RecordKind::HeartRate,
            Record::Steps { .. } => RecordKind::Steps,
            Record::Diet { .. } => RecordKind::Diet,
            Record::Exercise { .. } => RecordKind::Exercise,
        }
    }
}

/// The `type` discriminator of a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordKind {
    HeartRate,
    Steps,
    Diet,
    Exercise,
}

impl RecordKind {
    pub const ALL: [RecordKind; 4] = [
        RecordKind::HeartRate,
        RecordKind::Steps,
        RecordKind::Diet,
        RecordKind::Exercise,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RecordKind::HeartRate => "heart_rate",
            RecordKind::Steps => "steps",
            RecordKind::Diet => "diet",
            RecordKind::Exercise => "exercise",
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RecordKind {
    type Err = ProbeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RecordKind::ALL
            .iter()
            .copied()
            .find(|k| k.as_str() == s.trim())
            .ok_or_else(|| ProbeError::UnknownKind(s.to_string()))
    }
}
