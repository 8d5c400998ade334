//! Offset mapping by fixpoint elimination.
//!
//! Every observed transition is looked up in the expected-transition table.
//! A transition left with exactly one live candidate field is assigned and
//! that field is withdrawn from every other transition; passes repeat until
//! one assigns nothing. Transitions are visited in ascending
//! `(relative_offset, width, signedness)` order, so when two transitions
//! compete for the same last candidate the lower offset wins.
//!
//! Transitions at one offset but of different widths are readings of the
//! same bytes. Assigning a field there claims all of its readings, and the
//! entry lists every encoding that matched instead of picking one.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use strum::IntoStaticStr;
use tracing::debug;

use super::types::{
    Candidate, Confidence, ExpectedTransitions, FieldName, SchemaEntry, Transition,
};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum UnmappedReason {
    /// No expected transition has this `(old, new)` pair.
    NoExpectation,
    /// Every candidate field was assigned to another transition.
    CandidatesExhausted,
}

impl UnmappedReason {
    pub fn as_str(&self) -> &'static str {
        self.into()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnmappedTransition {
    pub transition: Transition,
    pub reason: UnmappedReason,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AmbiguousTransition {
    pub transition: Transition,
    /// Candidates still live after the fixpoint; always more than one field.
    pub candidates: Vec<Candidate>,
}

/// Result of mapping one probe's transitions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbeMapping {
    /// Confirmed and ambiguous field placements.
    pub entries: BTreeMap<FieldName, SchemaEntry>,
    pub ambiguous: Vec<AmbiguousTransition>,
    pub unmapped: Vec<UnmappedTransition>,
    /// Fields with an expected transition that matched nothing.
    pub unobserved: Vec<FieldName>,
}

impl ProbeMapping {
    pub fn confirmed_count(&self) -> usize {
        self.entries
            .values()
            .filter(|e| e.confidence == Confidence::Confirmed)
            .count()
    }

    pub fn exhausted_count(&self) -> usize {
        self.unmapped
            .iter()
            .filter(|u| u.reason == UnmappedReason::CandidatesExhausted)
            .count()
    }

    /// Confirmed fields over all fields that could have been observed.
    pub fn match_ratio(&self) -> f64 {
        let observable = self.entries.len() + self.unobserved.len();
        if observable == 0 {
            return 0.0;
        }
        self.confirmed_count() as f64 / observable as f64
    }
}

struct Slot<'a> {
    transition: &'a Transition,
    candidates: &'a [Candidate],
    resolved: bool,
}

impl Slot<'_> {
    fn live<'s>(
        &'s self,
        assigned: &'s BTreeMap<FieldName, Candidate>,
    ) -> impl Iterator<Item = &'s Candidate> {
        self.candidates
            .iter()
            .filter(move |c| !assigned.contains_key(&c.field))
    }
}

/// Map observed transitions onto field names.
pub fn map(transitions: &[Transition], expected: &ExpectedTransitions) -> ProbeMapping {
    let mut ordered: Vec<&Transition> = transitions.iter().collect();
    ordered.sort_by_key(|t| t.sort_key());
    ordered.dedup();

    let mut slots: Vec<Slot> = ordered
        .into_iter()
        .map(|transition| Slot {
            transition,
            candidates: expected
                .get(&transition.key())
                .map(Vec::as_slice)
                .unwrap_or(&[]),
            resolved: false,
        })
        .collect();

    let mut assigned: BTreeMap<FieldName, Candidate> = BTreeMap::new();
    let mut entries: BTreeMap<FieldName, SchemaEntry> = BTreeMap::new();
    let mut passes = 0;

    loop {
        passes += 1;
        let mut progress = false;

        for i in 0..slots.len() {
            if slots[i].resolved {
                continue;
            }
            let candidate = {
                let live: Vec<&Candidate> = slots[i].live(&assigned).collect();
                match live.first() {
                    Some(first) if live.iter().all(|c| c.field == first.field) => (*first).clone(),
                    _ => continue,
                }
            };

            // Every reading of this field at the same offset is the same
            // bytes seen under another layout.
            let offset = slots[i].transition.relative_offset;
            let mut encodings = Vec::new();
            for other in slots
                .iter_mut()
                .filter(|s| !s.resolved && s.transition.relative_offset == offset)
            {
                let before = encodings.len();
                encodings.extend(
                    other
                        .candidates
                        .iter()
                        .filter(|c| c.field == candidate.field)
                        .map(|c| c.encoding),
                );
                if encodings.len() > before {
                    other.resolved = true;
                }
            }

            let mut entry = SchemaEntry {
                field_name: candidate.field.clone(),
                relative_offset: offset,
                width: candidate.encoding.width(),
                encoding: candidate.encoding,
                alternative_encodings: Vec::new(),
                confidence: Confidence::Confirmed,
                alternatives: Vec::new(),
                probes: Vec::new(),
            };
            entry.set_encodings(encodings);
            if !entry.alternative_encodings.is_empty() {
                debug!(
                    "{} at {:+}: encodings {:?} all match",
                    entry.field_name,
                    offset,
                    entry.encodings()
                );
            }
            entries.insert(candidate.field.clone(), entry);
            assigned.insert(candidate.field.clone(), candidate);
            progress = true;
        }

        if !progress {
            break;
        }
    }

    let mut ambiguous = Vec::new();
    let mut unmapped = Vec::new();
    for slot in slots.iter().filter(|s| !s.resolved) {
        let live: Vec<Candidate> = slot.live(&assigned).cloned().collect();
        if slot.candidates.is_empty() {
            unmapped.push(UnmappedTransition {
                transition: *slot.transition,
                reason: UnmappedReason::NoExpectation,
            });
        } else if live.is_empty() {
            unmapped.push(UnmappedTransition {
                transition: *slot.transition,
                reason: UnmappedReason::CandidatesExhausted,
            });
        } else {
            ambiguous.push(AmbiguousTransition {
                transition: *slot.transition,
                candidates: live,
            });
        }
    }

    // Ambiguous transitions are in offset order, so the first sighting of a
    // field is its lowest candidate offset.
    for item in &ambiguous {
        for candidate in &item.candidates {
            let offset = item.transition.relative_offset;
            match entries.get_mut(&candidate.field) {
                Some(entry) if entry.relative_offset == offset => {
                    let mut encodings = entry.encodings();
                    encodings.push(candidate.encoding);
                    entry.set_encodings(encodings);
                }
                Some(entry) => {
                    if !entry.alternatives.contains(&offset) {
                        entry.alternatives.push(offset);
                    }
                }
                None => {
                    entries.insert(
                        candidate.field.clone(),
                        SchemaEntry {
                            field_name: candidate.field.clone(),
                            relative_offset: offset,
                            width: candidate.encoding.width(),
                            encoding: candidate.encoding,
                            alternative_encodings: Vec::new(),
                            confidence: Confidence::Ambiguous,
                            alternatives: Vec::new(),
                            probes: Vec::new(),
                        },
                    );
                }
            }
        }
    }

    let expected_fields: BTreeSet<&FieldName> = expected
        .values()
        .flatten()
        .map(|c| &c.field)
        .collect();
    let unobserved: Vec<FieldName> = expected_fields
        .into_iter()
        .filter(|f| !entries.contains_key(*f))
        .cloned()
        .collect();

    let mapping = ProbeMapping {
        entries,
        ambiguous,
        unmapped,
        unobserved,
    };
    debug!(
        "Mapped {} transition(s) in {} pass(es): {} confirmed, {} ambiguous, {} unmapped, {} unobserved",
        transitions.len(),
        passes,
        mapping.confirmed_count(),
        mapping.ambiguous.len(),
        mapping.unmapped.len(),
        mapping.unobserved.len()
    );
    mapping
}
