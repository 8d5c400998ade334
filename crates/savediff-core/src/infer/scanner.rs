//! Candidate scanning: raw value diffs around two anchors.

use std::ops::RangeInclusive;

use tracing::debug;

use crate::buffer::{Buffer, ByteWidth, Signedness};

use super::types::Transition;

/// Enumerate every relative offset in `window` whose decoded value differs
/// between `baseline` and `probe`.
///
/// Each buffer is bounds-checked on its own; offsets that fall outside
/// either buffer are skipped rather than failing the scan.
pub fn scan(
    baseline: &Buffer,
    probe: &Buffer,
    base_anchor: usize,
    probe_anchor: usize,
    window: RangeInclusive<i64>,
    width: ByteWidth,
    signedness: Signedness,
) -> Vec<Transition> {
    let transitions: Vec<Transition> = window
        .filter_map(|relative| {
            let old_raw = baseline.read_relative(base_anchor, relative, width, signedness)?;
            let new_raw = probe.read_relative(probe_anchor, relative, width, signedness)?;
            (old_raw != new_raw).then_some(Transition {
                relative_offset: relative,
                old_raw,
                new_raw,
                width,
                signedness,
            })
        })
        .collect();

    debug!(
        "Scan {}-byte {}: {} transition(s)",
        width.bytes(),
        signedness.as_str(),
        transitions.len()
    );
    transitions
}

/// Run [`scan`] once per `(width, signedness)` layout and merge the results
/// in `(relative_offset, width, signedness)` order.
pub fn scan_layouts(
    baseline: &Buffer,
    probe: &Buffer,
    base_anchor: usize,
    probe_anchor: usize,
    window: RangeInclusive<i64>,
    layouts: &[(ByteWidth, Signedness)],
) -> Vec<Transition> {
    let mut merged: Vec<Transition> = layouts
        .iter()
        .flat_map(|&(width, signedness)| {
            scan(
                baseline,
                probe,
                base_anchor,
                probe_anchor,
                window.clone(),
                width,
                signedness,
            )
        })
        .collect();
    merged.sort_by_key(Transition::sort_key);
    merged.dedup();
    merged
}
