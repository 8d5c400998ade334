//! Aggregated schema document and its JSON persistence.

mod aggregate;

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{Error, Result};
use crate::infer::{Confidence, FieldName, ProbeReport, SchemaEntry};

pub use aggregate::{Claim, Conflict, ConflictKind, aggregate};

/// A probe that could not be processed, kept for the operator.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FailedProbe {
    pub name: String,
    pub error: String,
}

impl FailedProbe {
    pub fn new(name: impl Into<String>, error: &Error) -> Self {
        Self {
            name: name.into(),
            error: error.to_string(),
        }
    }
}

/// Final output of a schema inference run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    /// Entity key all relative offsets are measured from.
    pub anchor_key: String,
    pub entries: BTreeMap<FieldName, SchemaEntry>,
    #[serde(default)]
    pub conflicts: Vec<Conflict>,
    #[serde(default)]
    pub probes: Vec<ProbeReport>,
    #[serde(default)]
    pub failed_probes: Vec<FailedProbe>,
}

impl Schema {
    /// Add a failed probe, keeping the list sorted by name.
    pub fn record_failure(&mut self, failure: FailedProbe) {
        let pos = self
            .failed_probes
            .binary_search(&failure)
            .unwrap_or_else(|pos| pos);
        self.failed_probes.insert(pos, failure);
    }

    pub fn count(&self, confidence: Confidence) -> usize {
        self.entries
            .values()
            .filter(|e| e.confidence == confidence)
            .count()
    }

    pub fn to_json(&self) -> Result<String> {
        let mut json = serde_json::to_string_pretty(self)?;
        json.push('\n');
        Ok(json)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        fs::write(&path, self.to_json()?)?;
        info!(
            "Schema written to {:?} ({} field(s), {} conflict(s))",
            path.as_ref(),
            self.entries.len(),
            self.conflicts.len()
        );
        Ok(())
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::ByteWidth;
    use crate::infer::Encoding;

    fn sample() -> Schema {
        let mut entries = BTreeMap::new();
        entries.insert(
            "pace".to_string(),
            SchemaEntry {
                field_name: "pace".to_string(),
                relative_offset: -40,
                width: ByteWidth::One,
                encoding: Encoding::ScaledBy(5),
                alternative_encodings: Vec::new(),
                confidence: Confidence::Confirmed,
                alternatives: Vec::new(),
                probes: vec!["physical".to_string()],
            },
        );
        Schema {
            anchor_key: "Ada Quill".to_string(),
            entries,
            conflicts: Vec::new(),
            probes: Vec::new(),
            failed_probes: Vec::new(),
        }
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("schema.json");
        let schema = sample();

        schema.save(&path).unwrap();
        assert_eq!(Schema::load(&path).unwrap(), schema);
    }

    #[test]
    fn test_json_shape() {
        let json = sample().to_json().unwrap();
        assert!(json.contains("\"encoding\": \"x5\""));
        assert!(json.contains("\"confidence\": \"confirmed\""));
        assert!(json.contains("\"width\": 1"));
        assert!(!json.contains("alternatives"));
    }

    #[test]
    fn test_record_failure_sorted() {
        let mut schema = sample();
        schema.record_failure(FailedProbe::new("b", &Error::Cancelled));
        schema.record_failure(FailedProbe::new("a", &Error::anchor_not_found("x")));
        let names: Vec<&str> = schema.failed_probes.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b"]);
        assert_eq!(schema.count(Confidence::Confirmed), 1);
    }
}
