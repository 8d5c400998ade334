//! Streaming zstd decompression of a single frame.

use std::io::Read;

use tracing::debug;

use crate::error::{Error, Result};

/// Decompress `compressed` by pulling fixed-size chunks until end of stream.
///
/// The decompressed size is never read from the frame header, so frames
/// written without a content size decode the same way.
pub fn decompress_chunked(compressed: &[u8], frame_index: u32, chunk_size: usize) -> Result<Vec<u8>> {
    let mut decoder = zstd::stream::read::Decoder::new(compressed)
        .map_err(|e| Error::decompression_failure(frame_index, e))?;

    let mut output = Vec::new();
    let mut chunk = vec![0u8; chunk_size.max(1)];

    loop {
        let read = decoder
            .read(&mut chunk)
            .map_err(|e| Error::decompression_failure(frame_index, e))?;
        if read == 0 {
            break;
        }
        output.extend_from_slice(&chunk[..read]);
    }

    if output.is_empty() && !compressed.is_empty() {
        debug!("Frame {} decompressed to zero bytes", frame_index);
    }

    Ok(output)
}
