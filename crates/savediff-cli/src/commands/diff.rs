//! Diff command implementation.
//!
//! Runs the candidate scanner once for a single width/signedness and prints
//! the raw transitions, for eyeballing a probe before writing expectations.

use std::ops::RangeInclusive;
use std::path::Path;

use anyhow::Result;
use savediff_core::infer::scan;
use savediff_core::locator::{locate, rank_by_distance};
use savediff_core::{ByteWidth, Config, Error, Signedness, find_anchors};

use crate::cli_utils::open_buffer;

#[allow(clippy::too_many_arguments)]
pub fn run(
    config: &Config,
    baseline_path: &Path,
    probe_path: &Path,
    key: &str,
    width: ByteWidth,
    signed: bool,
    window: Option<RangeInclusive<i64>>,
    limit: usize,
) -> Result<()> {
    let baseline = open_buffer(config, baseline_path)?;
    let probe = open_buffer(config, probe_path)?;

    let base_anchor = locate(&baseline, key, config.inference.anchor)?;
    let probe_anchors = find_anchors(&probe, key);
    let probe_anchor = rank_by_distance(&probe_anchors, base_anchor.absolute_offset)
        .first()
        .map(|a| a.absolute_offset)
        .ok_or_else(|| Error::anchor_not_found(key))?;

    let signedness = if signed {
        Signedness::Signed
    } else {
        Signedness::Unsigned
    };
    let window = window.unwrap_or_else(|| config.inference.window());

    println!(
        "Anchor {:?}: baseline 0x{:X}, probe 0x{:X} (delta {:+})",
        key,
        base_anchor.absolute_offset,
        probe_anchor,
        probe_anchor as i64 - base_anchor.absolute_offset as i64
    );
    println!(
        "Window {}..={}, {}-byte {}",
        window.start(),
        window.end(),
        width,
        signedness.as_str()
    );

    let transitions = scan(
        &baseline,
        &probe,
        base_anchor.absolute_offset,
        probe_anchor,
        window,
        width,
        signedness,
    );

    println!();
    println!("=== Transitions ({}) ===", transitions.len());
    for t in transitions.iter().take(limit) {
        println!(
            "  {:+7}  {:>11} -> {:<11}  (delta {:+})",
            t.relative_offset,
            t.old_raw.value,
            t.new_raw.value,
            t.new_raw.value - t.old_raw.value
        );
    }
    if transitions.len() > limit {
        println!("  ... and {} more", transitions.len() - limit);
    }
    Ok(())
}
