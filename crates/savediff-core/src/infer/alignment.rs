//! Structural shift detection.
//!
//! A probe saved after an upstream variable-length field changed size has
//! its record displaced by a constant number of bytes. The corrector slides
//! the probe anchor across a bounded range and keeps the shift under which
//! the most observed transitions match the expected table.

use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::buffer::{Buffer, ByteWidth, Signedness, offset_from};
use crate::cancel::CancelToken;
use crate::error::Result;

use super::scanner::scan_layouts;
use super::types::ExpectedTransitions;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ShiftReport {
    /// Bytes to add to the probe anchor.
    pub shift: i64,
    /// Matched expected transitions at `shift`.
    pub matches: usize,
    /// Matched expected transitions with no shift.
    pub unshifted_matches: usize,
}

/// Trial order: `0, -1, 1, -2, 2, ...` restricted to `range`.
///
/// Visiting shifts by increasing `|s|` (negative first) means a strictly
/// greater match count is needed to displace an earlier trial, which yields
/// the smallest-magnitude tie-break.
pub fn trial_order(range: RangeInclusive<i64>) -> Vec<i64> {
    let mut trials: Vec<i64> = range.collect();
    trials.sort_by_key(|s| (s.unsigned_abs(), *s));
    trials
}

/// Count transitions around the two anchors whose `(old, new)` pair is
/// expected.
pub fn count_matches(
    baseline: &Buffer,
    probe: &Buffer,
    base_anchor: usize,
    probe_anchor: usize,
    window: RangeInclusive<i64>,
    expected: &ExpectedTransitions,
) -> usize {
    let layouts = expected_layouts(expected);
    scan_layouts(baseline, probe, base_anchor, probe_anchor, window, &layouts)
        .iter()
        .filter(|t| expected.contains_key(&t.key()))
        .count()
}

/// Find the probe anchor shift that maximizes expected-transition matches.
///
/// Returns shift 0 when nothing matches under any trial. Checks `cancel`
/// before every trial.
#[allow(clippy::too_many_arguments)]
pub fn detect_shift(
    baseline: &Buffer,
    probe: &Buffer,
    base_anchor: usize,
    probe_anchor: usize,
    window: RangeInclusive<i64>,
    trial_range: RangeInclusive<i64>,
    expected: &ExpectedTransitions,
    cancel: &CancelToken,
) -> Result<ShiftReport> {
    let mut best = ShiftReport::default();
    let mut tried = 0usize;

    for shift in trial_order(trial_range) {
        cancel.check()?;
        let Some(anchor) = offset_from(probe_anchor, shift) else {
            continue;
        };
        tried += 1;

        let matches = count_matches(
            baseline,
            probe,
            base_anchor,
            anchor,
            window.clone(),
            expected,
        );
        if shift == 0 {
            best.unshifted_matches = matches;
        }
        if matches > best.matches {
            best.shift = shift;
            best.matches = matches;
        }
    }

    if best.shift != 0 {
        info!(
            "Detected shift {:+} ({} matches vs {} unshifted, {} trials)",
            best.shift, best.matches, best.unshifted_matches, tried
        );
    } else {
        debug!(
            "No shift improves on {} match(es) ({} trials)",
            best.matches, tried
        );
    }
    Ok(best)
}

fn expected_layouts(expected: &ExpectedTransitions) -> Vec<(ByteWidth, Signedness)> {
    let mut layouts: Vec<(ByteWidth, Signedness)> = expected
        .keys()
        .map(|(old, _)| (old.width, old.signedness))
        .collect();
    layouts.sort();
    layouts.dedup();
    layouts
}
