//! Anchors command implementation.

use std::path::Path;

use anyhow::Result;
use owo_colors::OwoColorize;
use savediff_core::dump::RegionDump;
use savediff_core::{Config, Error, find_all_length_prefixed, find_anchors};

use crate::cli_utils::open_buffer;

/// Print every occurrence of `key` with surrounding bytes.
pub fn run_key(config: &Config, path: &Path, key: &str, radius: usize, limit: usize) -> Result<()> {
    let buffer = open_buffer(config, path)?;
    let anchors = find_anchors(&buffer, key);
    if anchors.is_empty() {
        return Err(Error::anchor_not_found(key).into());
    }

    println!("{} occurrence(s) of {:?}", anchors.len(), key);
    for (i, anchor) in anchors.iter().take(limit).enumerate() {
        println!();
        println!(
            "{} payload=0x{:X} prefix={}-byte at 0x{:X}",
            format!("[{}]", i).cyan(),
            anchor.absolute_offset,
            anchor.prefix_width,
            anchor.prefix_offset()
        );
        for line in RegionDump::around_anchor(&buffer, anchor, radius).hex_dump {
            println!("  {}", line);
        }
    }
    if anchors.len() > limit {
        println!("  ... and {} more", anchors.len() - limit);
    }
    Ok(())
}

/// List length-prefixed strings in `min_len..=max_len`.
pub fn run_strings(
    config: &Config,
    path: &Path,
    min_len: usize,
    max_len: usize,
    limit: usize,
) -> Result<()> {
    let buffer = open_buffer(config, path)?;
    let strings = find_all_length_prefixed(&buffer, min_len, max_len);

    println!(
        "{} length-prefixed string(s) of {}..={} bytes",
        strings.len(),
        min_len,
        max_len
    );
    for (offset, text) in strings.iter().take(limit) {
        println!("  0x{:010X}  {:?}", offset, text);
    }
    if strings.len() > limit {
        println!("  ... and {} more", strings.len() - limit);
    }
    Ok(())
}
