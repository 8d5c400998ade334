//! CLI argument definitions for savediff.

use std::ops::RangeInclusive;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use savediff_core::ByteWidth;

#[derive(Parser, Debug)]
#[command(name = "savediff")]
#[command(about = "Save decompression and differential schema inference", version)]
pub struct Args {
    /// Config file (TOML); defaults are used when absent
    #[arg(short, long, global = true, value_name = "FILE", env = "SAVEDIFF_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Decompress one frame of a save file
    Decompress {
        /// Save file
        save: PathBuf,
        /// Frame index (default: largest frame)
        #[arg(long, conflicts_with = "largest")]
        frame: Option<u32>,
        /// Decompress the largest frame; this is also what happens without --frame
        #[arg(long)]
        largest: bool,
        /// Output file for the decompressed buffer
        #[arg(short, long)]
        output: PathBuf,
    },
    /// List the header and compressed frames of a save file
    Frames {
        /// Save file
        save: PathBuf,
    },
    /// Locate length-prefixed strings in a buffer
    Anchors {
        /// Save file or decompressed buffer
        buffer: PathBuf,
        /// Entity key to locate
        #[arg(long, required_unless_present = "strings")]
        key: Option<String>,
        /// List every length-prefixed string instead
        #[arg(long, conflicts_with = "key")]
        strings: bool,
        /// Minimum string length for --strings
        #[arg(long, default_value = "3")]
        min_len: usize,
        /// Maximum string length for --strings
        #[arg(long, default_value = "64")]
        max_len: usize,
        /// Bytes of context to dump around each anchor
        #[arg(long, default_value = "64")]
        radius: usize,
        /// Maximum number of results to print
        #[arg(long, default_value = "50")]
        limit: usize,
    },
    /// Show raw value changes between two buffers around an anchor
    Diff {
        /// Baseline save or buffer
        #[arg(long)]
        baseline: PathBuf,
        /// Modified save or buffer
        #[arg(long)]
        probe: PathBuf,
        /// Entity key to anchor on
        #[arg(long)]
        anchor: String,
        /// Value width in bytes (1, 2 or 4)
        #[arg(long, default_value = "1", value_parser = parse_width)]
        width: ByteWidth,
        /// Decode values as signed
        #[arg(long)]
        signed: bool,
        /// Relative window, e.g. -512..512 (default: from config)
        #[arg(long, value_parser = parse_window, allow_hyphen_values = true)]
        window: Option<RangeInclusive<i64>>,
        /// Maximum number of transitions to print
        #[arg(long, default_value = "200")]
        limit: usize,
    },
    /// Infer a field schema from baseline/probe pairs
    InferSchema {
        /// Baseline save or buffer
        #[arg(long)]
        baseline: PathBuf,
        /// Probe as <buffer>:<expectations.toml>; repeatable
        #[arg(long = "probe", required = true, value_parser = parse_probe_spec)]
        probes: Vec<ProbeSpec>,
        /// Entity key to anchor on
        #[arg(long)]
        anchor: String,
        /// Output schema file (JSON)
        #[arg(short, long)]
        output: PathBuf,
        /// Relative window, e.g. -8192..8192 (default: from config)
        #[arg(long, value_parser = parse_window, allow_hyphen_values = true)]
        window: Option<RangeInclusive<i64>>,
    },
}

/// A probe buffer paired with its expectations file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeSpec {
    pub buffer: PathBuf,
    pub expectations: PathBuf,
}

/// Parse `<buffer>:<expectations>`, splitting on the last `:`.
pub fn parse_probe_spec(s: &str) -> Result<ProbeSpec, String> {
    let (buffer, expectations) = s
        .rsplit_once(':')
        .ok_or_else(|| format!("expected <buffer>:<expectations>, got '{}'", s))?;
    if buffer.is_empty() || expectations.is_empty() {
        return Err(format!("expected <buffer>:<expectations>, got '{}'", s));
    }
    Ok(ProbeSpec {
        buffer: PathBuf::from(buffer),
        expectations: PathBuf::from(expectations),
    })
}

/// Parse `a..b` or `a..=b` (both inclusive).
pub fn parse_window(s: &str) -> Result<RangeInclusive<i64>, String> {
    let (start, end) = s
        .split_once("..=")
        .or_else(|| s.split_once(".."))
        .ok_or_else(|| format!("expected <start>..<end>, got '{}'", s))?;
    let start: i64 = start
        .trim()
        .parse()
        .map_err(|e| format!("invalid window start '{}': {}", start, e))?;
    let end: i64 = end
        .trim()
        .parse()
        .map_err(|e| format!("invalid window end '{}': {}", end, e))?;
    if start > end {
        return Err(format!("window start {} is after end {}", start, end));
    }
    Ok(start..=end)
}

pub fn parse_width(s: &str) -> Result<ByteWidth, String> {
    let bytes: usize = s.parse().map_err(|_| format!("invalid width '{}'", s))?;
    ByteWidth::from_bytes(bytes).ok_or_else(|| format!("width must be 1, 2 or 4, got {}", bytes))
}
