//! Probe expectation documents.
//!
//! Each probe ships with a small TOML file naming the category that was
//! changed and the domain-level `[old, new]` value of every field in it:
//!
//! ```toml
//! category = "attributes"
//! anchor = "John Smith"
//! encodings = ["raw", "x5"]
//!
//! [fields]
//! finishing = [10, 3]
//! pace = [12, 12]
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};

use super::types::{Encoding, FieldName};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CategoryExpectations {
    pub category: String,
    /// Entity key to anchor on; overrides the run-wide key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub anchor: Option<String>,
    /// Encoding hypotheses; overrides the configured set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encodings: Option<Vec<Encoding>>,
    /// `field -> (old_domain, new_domain)`.
    #[serde(default)]
    pub fields: BTreeMap<FieldName, (i64, i64)>,
}

impl CategoryExpectations {
    pub fn new(category: impl Into<String>) -> Self {
        Self {
            category: category.into(),
            anchor: None,
            encodings: None,
            fields: BTreeMap::new(),
        }
    }

    /// Builder-style helper used by tests and callers assembling probes in code.
    pub fn field(mut self, name: impl Into<String>, old: i64, new: i64) -> Self {
        self.fields.insert(name.into(), (old, new));
        self
    }

    pub fn parse(content: &str) -> Result<Self> {
        let expectations: Self =
            toml::from_str(content).map_err(|e| Error::InvalidExpectations(e.to_string()))?;
        expectations.validate()?;
        Ok(expectations)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        let expectations = Self::parse(&content).map_err(|e| match e {
            Error::InvalidExpectations(msg) => {
                Error::InvalidExpectations(format!("{}: {}", path.display(), msg))
            }
            other => other,
        })?;
        debug!(
            "Loaded expectations {:?}: category={} fields={}",
            path,
            expectations.category,
            expectations.fields.len()
        );
        Ok(expectations)
    }

    /// Fields expected to change, i.e. observable from a diff.
    pub fn changed_fields(&self) -> impl Iterator<Item = &FieldName> {
        self.fields
            .iter()
            .filter(|(_, (old, new))| old != new)
            .map(|(name, _)| name)
    }

    /// The encodings to try: the document's own list, or `fallback`.
    pub fn encodings_or<'a>(&'a self, fallback: &'a [Encoding]) -> &'a [Encoding] {
        self.encodings.as_deref().unwrap_or(fallback)
    }

    fn validate(&self) -> Result<()> {
        if self.category.trim().is_empty() {
            return Err(Error::InvalidExpectations(
                "category must not be empty".to_string(),
            ));
        }
        if self.fields.is_empty() {
            return Err(Error::InvalidExpectations(format!(
                "category '{}' declares no fields",
                self.category
            )));
        }
        if matches!(&self.encodings, Some(list) if list.is_empty()) {
            return Err(Error::InvalidExpectations(
                "encodings list must not be empty".to_string(),
            ));
        }
        if matches!(&self.anchor, Some(key) if key.is_empty()) {
            return Err(Error::InvalidExpectations(
                "anchor must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
category = "attributes"
anchor = "John Smith"
encodings = ["raw", "x5"]

[fields]
finishing = [10, 3]
pace = [12, 12]
"#;

    #[test]
    fn test_parse_sample() {
        let exp = CategoryExpectations::parse(SAMPLE).unwrap();
        assert_eq!(exp.category, "attributes");
        assert_eq!(exp.anchor.as_deref(), Some("John Smith"));
        assert_eq!(
            exp.encodings,
            Some(vec![Encoding::Raw, Encoding::ScaledBy(5)])
        );
        assert_eq!(exp.fields["finishing"], (10, 3));
        let changed: Vec<&String> = exp.changed_fields().collect();
        assert_eq!(changed, vec!["finishing"]);
    }

    #[test]
    fn test_encodings_fallback() {
        let exp = CategoryExpectations::new("mental").field("bravery", 4, 9);
        assert_eq!(
            exp.encodings_or(&Encoding::DEFAULT_SET),
            &Encoding::DEFAULT_SET[..]
        );
    }

    #[test]
    fn test_parse_rejects_bad_encoding() {
        let err = CategoryExpectations::parse(
            "category = \"a\"\nencodings = [\"float\"]\n[fields]\nx = [1, 2]\n",
        )
        .unwrap_err();
        assert!(matches!(err, Error::InvalidExpectations(_)));
    }

    #[test]
    fn test_parse_rejects_missing_fields() {
        let err = CategoryExpectations::parse("category = \"a\"\n").unwrap_err();
        assert!(matches!(err, Error::InvalidExpectations(msg) if msg.contains("no fields")));
    }

    #[test]
    fn test_parse_rejects_malformed_pair() {
        let err =
            CategoryExpectations::parse("category = \"a\"\n[fields]\nx = [1]\n").unwrap_err();
        assert!(matches!(err, Error::InvalidExpectations(_)));
    }

    #[test]
    fn test_load_prefixes_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.toml");
        fs::write(&path, "category = ").unwrap();

        let err = CategoryExpectations::load(&path).unwrap_err();
        assert!(matches!(err, Error::InvalidExpectations(msg) if msg.contains("broken.toml")));
    }
}
