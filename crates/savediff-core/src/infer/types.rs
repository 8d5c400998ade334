//! Types shared by the scanner, resolver, mapper and aggregator.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use strum::IntoStaticStr;

use crate::buffer::{ByteWidth, RawValue, Signedness};

pub type FieldName = String;

/// Stored representation hypothesis for a domain value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum Encoding {
    /// Domain value stored verbatim in one unsigned byte.
    Raw,
    /// Domain value multiplied by `k`, one unsigned byte.
    ScaledBy(u32),
    Signed16,
    Unsigned16,
}

impl Encoding {
    pub const DEFAULT_SET: [Encoding; 4] = [
        Encoding::Raw,
        Encoding::ScaledBy(5),
        Encoding::Signed16,
        Encoding::Unsigned16,
    ];

    pub fn width(&self) -> ByteWidth {
        match self {
            Encoding::Raw | Encoding::ScaledBy(_) => ByteWidth::One,
            Encoding::Signed16 | Encoding::Unsigned16 => ByteWidth::Two,
        }
    }

    pub fn signedness(&self) -> Signedness {
        match self {
            Encoding::Signed16 => Signedness::Signed,
            _ => Signedness::Unsigned,
        }
    }

    /// Forward transform; `None` when the result does not fit the width.
    pub fn encode(&self, domain: i64) -> Option<RawValue> {
        let value = match self {
            Encoding::ScaledBy(k) => domain.checked_mul(*k as i64)?,
            _ => domain,
        };
        RawValue::checked(value, self.width(), self.signedness())
    }
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Encoding::Raw => write!(f, "raw"),
            Encoding::ScaledBy(k) => write!(f, "x{}", k),
            Encoding::Signed16 => write!(f, "i16"),
            Encoding::Unsigned16 => write!(f, "u16"),
        }
    }
}

impl FromStr for Encoding {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_lowercase();
        match s.as_str() {
            "raw" => return Ok(Encoding::Raw),
            "i16" | "signed16" => return Ok(Encoding::Signed16),
            "u16" | "unsigned16" => return Ok(Encoding::Unsigned16),
            _ => {}
        }

        let factor = s
            .strip_prefix("scaled:")
            .or_else(|| s.strip_prefix('x'))
            .ok_or_else(|| format!("unknown encoding '{}'", s))?;
        let k: u32 = factor
            .parse()
            .map_err(|e| format!("invalid scale in '{}': {}", s, e))?;
        if k == 0 {
            return Err(format!("scale must be non-zero in '{}'", s));
        }
        Ok(Encoding::ScaledBy(k))
    }
}

impl From<Encoding> for String {
    fn from(encoding: Encoding) -> Self {
        encoding.to_string()
    }
}

impl TryFrom<String> for Encoding {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// An observed value change at an offset relative to an anchor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Transition {
    pub relative_offset: i64,
    pub old_raw: RawValue,
    pub new_raw: RawValue,
    pub width: ByteWidth,
    pub signedness: Signedness,
}

impl Transition {
    pub fn key(&self) -> TransitionKey {
        (self.old_raw, self.new_raw)
    }

    /// Ordering used wherever a deterministic processing order matters.
    pub fn sort_key(&self) -> (i64, ByteWidth, Signedness) {
        (self.relative_offset, self.width, self.signedness)
    }
}

pub type TransitionKey = (RawValue, RawValue);

/// One field hypothesis behind an expected transition.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Candidate {
    pub field: FieldName,
    pub encoding: Encoding,
}

/// Expected `(old_raw, new_raw)` pairs and the fields that could produce them.
pub type ExpectedTransitions = BTreeMap<TransitionKey, Vec<Candidate>>;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Confidence {
    Confirmed,
    Ambiguous,
    Conflicted,
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name: &'static str = self.into();
        write!(f, "{}", name)
    }
}

/// Inferred location and representation of one field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaEntry {
    pub field_name: FieldName,
    pub relative_offset: i64,
    pub width: ByteWidth,
    pub encoding: Encoding,
    /// Further encodings that explain the same transitions at this offset.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub alternative_encodings: Vec<Encoding>,
    pub confidence: Confidence,
    /// Other offsets still possible for an ambiguous field.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub alternatives: Vec<i64>,
    /// Probes whose evidence supports this entry.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub probes: Vec<String>,
}

impl SchemaEntry {
    /// Every offset this entry may occupy, ascending.
    pub fn candidate_offsets(&self) -> Vec<i64> {
        let mut offsets = vec![self.relative_offset];
        offsets.extend_from_slice(&self.alternatives);
        offsets.sort_unstable();
        offsets.dedup();
        offsets
    }

    /// Primary and alternative encodings, ascending.
    pub fn encodings(&self) -> Vec<Encoding> {
        let mut encodings = vec![self.encoding];
        encodings.extend_from_slice(&self.alternative_encodings);
        encodings.sort_unstable();
        encodings.dedup();
        encodings
    }

    /// Replace the encoding hypotheses. The lowest (and narrowest) encoding
    /// becomes the primary one and sets `width`; an empty set is ignored.
    pub fn set_encodings(&mut self, encodings: impl IntoIterator<Item = Encoding>) {
        let mut all: Vec<Encoding> = encodings.into_iter().collect();
        all.sort_unstable();
        all.dedup();
        let Some((&primary, rest)) = all.split_first() else {
            return;
        };
        self.encoding = primary;
        self.width = primary.width();
        self.alternative_encodings = rest.to_vec();
    }

    /// Relative byte range `[start, end)` covered by the entry.
    pub fn byte_range(&self) -> (i64, i64) {
        (
            self.relative_offset,
            self.relative_offset + self.width.bytes() as i64,
        )
    }
}
