//! Frames command implementation.
//!
//! Prints the parsed header and every discovered frame; the frame
//! `decompress` would pick by default is marked.

use std::path::Path;

use anyhow::Result;
use owo_colors::OwoColorize;
use savediff_core::container::largest_frame;
use savediff_core::{CancelToken, Config, RawFile};

pub fn run(config: &Config, save: &Path) -> Result<()> {
    let raw = RawFile::open_with(save, &config.container, &CancelToken::new())?;
    let header = raw.header();

    println!("=== Header ===");
    println!("Magic prefix: 0x{:04X}", header.magic_prefix);
    println!("Signature:    {:?}", header.signature_str());
    println!("Version:      {}", header.version);
    println!("File size:    {} bytes", raw.len());

    let largest = largest_frame(raw.frames()).map(|f| f.index);

    println!();
    println!("=== Frames ({}) ===", raw.frames().len());
    for frame in raw.frames() {
        let line = format!(
            "  [{:3}] start=0x{:010X} length={:>12}",
            frame.index, frame.start_offset, frame.byte_length
        );
        if Some(frame.index) == largest {
            println!("{} {}", line, "(largest)".green());
        } else {
            println!("{}", line);
        }
    }
    Ok(())
}
