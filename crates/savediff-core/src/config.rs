//! Run configuration.
//!
//! Loaded from a TOML file; every section and key is optional and falls back
//! to the defaults below.
//!
//! ```toml
//! [container]
//! header_len = 26
//! chunk_size = 16777216
//!
//! [inference]
//! window_start = -8192
//! window_end = 8192
//! encodings = ["raw", "x5", "i16", "u16"]
//! shift_start = -512
//! shift_end = 512
//! min_match_ratio = 0.5
//! anchor = "first"
//! ```

use std::fs;
use std::ops::RangeInclusive;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::container::ContainerFormat;
use crate::error::{Error, Result};
use crate::infer::Encoding;
use crate::locator::AnchorSelection;

/// Relative scan window used when none is configured.
pub const DEFAULT_WINDOW: RangeInclusive<i64> = -8192..=8192;
/// Trial shifts for alignment correction when none are configured.
pub const DEFAULT_SHIFT_RANGE: RangeInclusive<i64> = -512..=512;
/// Confirmed-field ratio below which alignment correction runs.
pub const DEFAULT_MIN_MATCH_RATIO: f64 = 0.5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct InferenceOptions {
    pub window_start: i64,
    pub window_end: i64,
    pub encodings: Vec<Encoding>,
    pub shift_start: i64,
    pub shift_end: i64,
    pub min_match_ratio: f64,
    pub anchor: AnchorSelection,
}

impl Default for InferenceOptions {
    fn default() -> Self {
        Self {
            window_start: *DEFAULT_WINDOW.start(),
            window_end: *DEFAULT_WINDOW.end(),
            encodings: Encoding::DEFAULT_SET.to_vec(),
            shift_start: *DEFAULT_SHIFT_RANGE.start(),
            shift_end: *DEFAULT_SHIFT_RANGE.end(),
            min_match_ratio: DEFAULT_MIN_MATCH_RATIO,
            anchor: AnchorSelection::default(),
        }
    }
}

impl InferenceOptions {
    pub fn window(&self) -> RangeInclusive<i64> {
        self.window_start..=self.window_end
    }

    pub fn shift_range(&self) -> RangeInclusive<i64> {
        self.shift_start..=self.shift_end
    }

    pub fn validate(&self) -> Result<()> {
        if self.window_start > self.window_end {
            return Err(Error::InvalidConfig(format!(
                "empty window {}..={}",
                self.window_start, self.window_end
            )));
        }
        if self.shift_start > self.shift_end {
            return Err(Error::InvalidConfig(format!(
                "empty shift range {}..={}",
                self.shift_start, self.shift_end
            )));
        }
        if self.encodings.is_empty() {
            return Err(Error::InvalidConfig("no encodings configured".to_string()));
        }
        if !(0.0..=1.0).contains(&self.min_match_ratio) {
            return Err(Error::InvalidConfig(format!(
                "min_match_ratio {} outside 0..=1",
                self.min_match_ratio
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub container: ContainerFormat,
    pub inference: InferenceOptions,
}

impl Config {
    pub fn parse(content: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(content).map_err(|e| Error::InvalidConfig(e.to_string()))?;
        config.inference.validate()?;
        if config.container.chunk_size == 0 {
            return Err(Error::InvalidConfig("chunk_size must be non-zero".to_string()));
        }
        Ok(config)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path)?;
        let config = Self::parse(&content)?;
        debug!("Loaded config from {:?}", path.as_ref());
        Ok(config)
    }
}
