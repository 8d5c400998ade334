//! Decompress command implementation.

use std::path::Path;

use anyhow::Result;
use savediff_core::{CancelToken, Config, RawFile};
use tracing::info;

/// Decompress `frame` (or the largest frame) of `save` into `output`.
pub fn run(config: &Config, save: &Path, frame: Option<u32>, output: &Path) -> Result<()> {
    let raw = RawFile::open_with(save, &config.container, &CancelToken::new())?;
    info!("{} frame(s) in {:?}", raw.frames().len(), save);

    let buffer = match frame {
        Some(index) => raw.decompress_frame(index)?,
        None => raw.decompress_largest_frame()?,
    };
    buffer.save(output)?;

    println!(
        "Wrote {} bytes to {}",
        buffer.len(),
        output.display()
    );
    Ok(())
}
