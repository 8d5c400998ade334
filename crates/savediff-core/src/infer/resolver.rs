//! Scale/encoding resolution: domain expectations to raw transitions.

use std::collections::BTreeMap;

use tracing::debug;

use crate::buffer::{ByteWidth, Signedness};

use super::types::{Candidate, Encoding, ExpectedTransitions, FieldName};

/// Build the table of `(old_raw, new_raw)` pairs each field could produce
/// under each candidate encoding.
///
/// Unchanged fields are unobservable and skipped, as are encodings whose
/// forward transform does not fit the stored width. Fields that collide on
/// the same raw pair are grouped under one key; each candidate list is
/// sorted and deduplicated.
pub fn build_expected_transitions(
    fields: &BTreeMap<FieldName, (i64, i64)>,
    encodings: &[Encoding],
) -> ExpectedTransitions {
    let mut expected = ExpectedTransitions::new();

    for (field, &(old_domain, new_domain)) in fields {
        if old_domain == new_domain {
            continue;
        }
        for &encoding in encodings {
            let (Some(old_raw), Some(new_raw)) =
                (encoding.encode(old_domain), encoding.encode(new_domain))
            else {
                continue;
            };
            expected.entry((old_raw, new_raw)).or_default().push(Candidate {
                field: field.clone(),
                encoding,
            });
        }
    }

    for candidates in expected.values_mut() {
        candidates.sort();
        candidates.dedup();
    }

    debug!(
        "{} field(s) x {} encoding(s) -> {} expected transition(s)",
        fields.len(),
        encodings.len(),
        expected.len()
    );
    expected
}

/// Distinct `(width, signedness)` layouts the scanner must cover for
/// `encodings`, in ascending order.
pub fn scan_layouts_for(encodings: &[Encoding]) -> Vec<(ByteWidth, Signedness)> {
    let mut layouts: Vec<(ByteWidth, Signedness)> = encodings
        .iter()
        .map(|e| (e.width(), e.signedness()))
        .collect();
    layouts.sort();
    layouts.dedup();
    layouts
}
