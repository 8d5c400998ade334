//! Cross-probe aggregation.
//!
//! Per field, observations from every probe are merged:
//!
//! - confirmed placements that agree on the offset and share at least one
//!   encoding stay confirmed with the shared encodings; any other
//!   disagreement makes the field `Conflicted`
//! - ambiguous placements are intersected; a single surviving offset is
//!   promoted to confirmed, an empty intersection is a conflict
//! - two different fields whose confirmed byte ranges overlap are both
//!   marked `Conflicted`
//!
//! Nothing is averaged or picked: every conflict keeps the claims that
//! caused it.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use strum::IntoStaticStr;
use tracing::{debug, warn};

use crate::buffer::ByteWidth;
use crate::infer::{Confidence, Encoding, FieldName, ProbeReport, SchemaEntry};

use super::Schema;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ConflictKind {
    /// Distinct fields claim overlapping bytes.
    SharedOffset,
    /// Probes place the same field at different offsets or encodings.
    DivergentOffset,
}

impl ConflictKind {
    pub fn as_str(&self) -> &'static str {
        self.into()
    }
}

/// One probe's placement of one field.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Claim {
    pub probe: String,
    pub field: FieldName,
    pub relative_offset: i64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub alternatives: Vec<i64>,
    pub width: ByteWidth,
    pub encoding: Encoding,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub alternative_encodings: Vec<Encoding>,
    pub confidence: Confidence,
}

impl Claim {
    fn from_entry(probe: &str, entry: &SchemaEntry) -> Self {
        Self {
            probe: probe.to_string(),
            field: entry.field_name.clone(),
            relative_offset: entry.relative_offset,
            alternatives: entry.alternatives.clone(),
            width: entry.width,
            encoding: entry.encoding,
            alternative_encodings: entry.alternative_encodings.clone(),
            confidence: entry.confidence,
        }
    }

    fn encodings(&self) -> BTreeSet<Encoding> {
        std::iter::once(self.encoding)
            .chain(self.alternative_encodings.iter().copied())
            .collect()
    }

    fn offsets(&self) -> BTreeSet<i64> {
        std::iter::once(self.relative_offset)
            .chain(self.alternatives.iter().copied())
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conflict {
    pub kind: ConflictKind,
    /// Fields involved, sorted.
    pub fields: Vec<FieldName>,
    pub claims: Vec<Claim>,
}

/// Merge per-probe mappings into one schema.
pub fn aggregate(anchor_key: &str, reports: Vec<ProbeReport>) -> Schema {
    let mut claims: BTreeMap<FieldName, Vec<Claim>> = BTreeMap::new();
    for report in &reports {
        for entry in report.mapping.entries.values() {
            claims
                .entry(entry.field_name.clone())
                .or_default()
                .push(Claim::from_entry(&report.probe, entry));
        }
    }

    let mut entries = BTreeMap::new();
    let mut conflicts = Vec::new();
    for (field, field_claims) in &claims {
        let (entry, conflict) = merge_field(field, field_claims);
        entries.insert(field.clone(), entry);
        conflicts.extend(conflict);
    }

    conflicts.extend(mark_shared_offsets(&mut entries, &claims));
    conflicts.sort_by(|a, b| (a.kind, &a.fields).cmp(&(b.kind, &b.fields)));

    for conflict in &conflicts {
        warn!(
            "Conflict ({}): {}",
            conflict.kind.as_str(),
            conflict.fields.join(", ")
        );
    }
    debug!(
        "Aggregated {} probe(s): {} field(s), {} conflict(s)",
        reports.len(),
        entries.len(),
        conflicts.len()
    );

    Schema {
        anchor_key: anchor_key.to_string(),
        entries,
        conflicts,
        probes: reports,
        failed_probes: Vec::new(),
    }
}

fn merge_field(field: &str, claims: &[Claim]) -> (SchemaEntry, Option<Conflict>) {
    let confirmed: Vec<&Claim> = claims
        .iter()
        .filter(|c| c.confidence == Confidence::Confirmed)
        .collect();
    let ambiguous: Vec<&Claim> = claims
        .iter()
        .filter(|c| c.confidence != Confidence::Confirmed)
        .collect();

    if let Some(first) = confirmed.first() {
        let offset = first.relative_offset;
        let shared = confirmed.iter().skip(1).fold(first.encodings(), |acc, c| {
            acc.intersection(&c.encodings()).copied().collect()
        });
        let agrees = !shared.is_empty()
            && confirmed.iter().all(|c| c.relative_offset == offset)
            && ambiguous.iter().all(|c| c.offsets().contains(&offset));
        if agrees {
            let mut entry = build_entry(field, first, Vec::new(), Confidence::Confirmed, claims);
            entry.set_encodings(shared);
            return (entry, None);
        }
        return divergent(field, claims);
    }

    let mut surviving: Option<BTreeSet<i64>> = None;
    for claim in &ambiguous {
        let offsets = claim.offsets();
        surviving = Some(match surviving {
            Some(current) => current.intersection(&offsets).copied().collect(),
            None => offsets,
        });
    }
    let surviving: Vec<i64> = surviving.unwrap_or_default().into_iter().collect();

    match surviving.as_slice() {
        [] => divergent(field, claims),
        [offset] => {
            let basis = claim_at(&ambiguous, *offset);
            debug!("{}: intersection leaves offset {}", field, offset);
            let entry = SchemaEntry {
                relative_offset: *offset,
                ..build_entry(field, basis, Vec::new(), Confidence::Confirmed, claims)
            };
            (entry, None)
        }
        [lowest, rest @ ..] => {
            let basis = claim_at(&ambiguous, *lowest);
            let entry = SchemaEntry {
                relative_offset: *lowest,
                ..build_entry(field, basis, rest.to_vec(), Confidence::Ambiguous, claims)
            };
            (entry, None)
        }
    }
}

fn divergent(field: &str, claims: &[Claim]) -> (SchemaEntry, Option<Conflict>) {
    let offsets: BTreeSet<i64> = claims.iter().flat_map(Claim::offsets).collect();
    let mut offsets = offsets.into_iter();
    let lowest = offsets.next().unwrap_or_default();
    let basis = claims
        .iter()
        .find(|c| c.offsets().contains(&lowest))
        .unwrap_or(&claims[0]);

    let entry = SchemaEntry {
        relative_offset: lowest,
        ..build_entry(field, basis, offsets.collect(), Confidence::Conflicted, claims)
    };
    let mut sorted = claims.to_vec();
    sorted.sort();
    let conflict = Conflict {
        kind: ConflictKind::DivergentOffset,
        fields: vec![field.to_string()],
        claims: sorted,
    };
    (entry, Some(conflict))
}

fn mark_shared_offsets(
    entries: &mut BTreeMap<FieldName, SchemaEntry>,
    claims: &BTreeMap<FieldName, Vec<Claim>>,
) -> Vec<Conflict> {
    let confirmed: Vec<&SchemaEntry> = entries
        .values()
        .filter(|e| e.confidence == Confidence::Confirmed)
        .collect();

    let mut conflicts = Vec::new();
    let mut flagged = BTreeSet::new();
    for (i, a) in confirmed.iter().enumerate() {
        for b in &confirmed[i + 1..] {
            if !overlaps(a.byte_range(), b.byte_range()) {
                continue;
            }
            let mut involved: Vec<Claim> = [&a.field_name, &b.field_name]
                .into_iter()
                .flat_map(|f| claims.get(f).into_iter().flatten().cloned())
                .collect();
            involved.sort();
            conflicts.push(Conflict {
                kind: ConflictKind::SharedOffset,
                fields: vec![a.field_name.clone(), b.field_name.clone()],
                claims: involved,
            });
            flagged.insert(a.field_name.clone());
            flagged.insert(b.field_name.clone());
        }
    }

    for field in &flagged {
        if let Some(entry) = entries.get_mut(field) {
            entry.confidence = Confidence::Conflicted;
        }
    }
    conflicts
}

fn overlaps((a_start, a_end): (i64, i64), (b_start, b_end): (i64, i64)) -> bool {
    a_start < b_end && b_start < a_end
}

fn claim_at<'c>(claims: &[&'c Claim], offset: i64) -> &'c Claim {
    claims
        .iter()
        .copied()
        .find(|c| c.offsets().contains(&offset))
        .unwrap_or(claims[0])
}

fn build_entry(
    field: &str,
    basis: &Claim,
    alternatives: Vec<i64>,
    confidence: Confidence,
    claims: &[Claim],
) -> SchemaEntry {
    let probes: BTreeSet<String> = claims.iter().map(|c| c.probe.clone()).collect();
    SchemaEntry {
        field_name: field.to_string(),
        relative_offset: basis.relative_offset,
        width: basis.width,
        encoding: basis.encoding,
        alternative_encodings: basis.alternative_encodings.clone(),
        confidence,
        alternatives,
        probes: probes.into_iter().collect(),
    }
}
