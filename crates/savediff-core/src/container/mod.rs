//! Save container decompression.
//!
//! A save file is a fixed header followed by concatenated zstd frames with no
//! directory. `RawFile` holds the whole file in memory, discovers frames by
//! scanning for the frame magic, and decompresses one frame at a time into a
//! [`Buffer`].
//!
//! ## Submodules
//!
//! - `format`: header layout and validation
//! - `frame`: marker scanning and frame descriptors
//! - `decoder`: chunked streaming decompression

mod decoder;
mod format;
mod frame;

use std::fs;
use std::path::Path;

use tracing::{debug, info};

use crate::buffer::Buffer;
use crate::cancel::CancelToken;
use crate::error::{ContainerError, Result};

pub use decoder::decompress_chunked;
pub use format::{ContainerFormat, DEFAULT_CHUNK_SIZE, SaveHeader, ZSTD_FRAME_MAGIC, parse_header};
pub use frame::{FrameDescriptor, find_markers, largest_frame, scan_frames};

/// A save file read fully into memory, with its header validated and its
/// frames enumerated.
#[derive(Debug, Clone)]
pub struct RawFile {
    data: Vec<u8>,
    header: SaveHeader,
    frames: Vec<FrameDescriptor>,
    format: ContainerFormat,
}

impl RawFile {
    /// Open a save with the default container format.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::open_with(path, &ContainerFormat::default(), &CancelToken::new())
    }

    pub fn open_with<P: AsRef<Path>>(
        path: P,
        format: &ContainerFormat,
        cancel: &CancelToken,
    ) -> Result<Self> {
        let data = fs::read(&path)?;
        info!(
            "Read {:?} ({:.1} MiB)",
            path.as_ref(),
            data.len() as f64 / 1024.0 / 1024.0
        );
        Self::from_bytes(data, format, cancel)
    }

    pub fn from_bytes(data: Vec<u8>, format: &ContainerFormat, cancel: &CancelToken) -> Result<Self> {
        let header = parse_header(&data, format)?;
        debug!(
            "Header: prefix={:#06x} signature={:?} version={}",
            header.magic_prefix,
            header.signature_str(),
            header.version
        );

        let frames = scan_frames(
            &data,
            format.effective_header_len(),
            &format.frame_magic,
            cancel,
        )?;

        Ok(Self {
            data,
            header,
            frames,
            format: format.clone(),
        })
    }

    pub fn header(&self) -> &SaveHeader {
        &self.header
    }

    pub fn frames(&self) -> &[FrameDescriptor] {
        &self.frames
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Compressed bytes of one frame.
    pub fn frame_bytes(&self, index: u32) -> Result<&[u8]> {
        let frame = self.frame(index)?;
        Ok(&self.data[frame.start_offset..frame.end_offset()])
    }

    /// Decompress the frame at `index`.
    pub fn decompress_frame(&self, index: u32) -> Result<Buffer> {
        let compressed = self.frame_bytes(index)?;
        let output = decompress_chunked(compressed, index, self.format.chunk_size)?;
        info!(
            "Frame {}: {} -> {} bytes",
            index,
            compressed.len(),
            output.len()
        );
        Ok(Buffer::new(output))
    }

    /// Heuristic entry point: decompress the frame with the greatest
    /// compressed length, assumed to be the main database.
    pub fn decompress_largest_frame(&self) -> Result<Buffer> {
        let frame = largest_frame(&self.frames).ok_or(ContainerError::NoFramesFound)?;
        debug!(
            "Largest frame: #{} ({} bytes at {:#x})",
            frame.index, frame.byte_length, frame.start_offset
        );
        self.decompress_frame(frame.index)
    }

    fn frame(&self, index: u32) -> Result<&FrameDescriptor> {
        self.frames.get(index as usize).ok_or_else(|| {
            ContainerError::FrameIndexOutOfRange {
                index,
                count: self.frames.len(),
            }
            .into()
        })
    }
}

/// Load either a save container or an already decompressed buffer.
///
/// Files that start with the container signature are decompressed
/// (largest frame); anything else is taken as raw database bytes.
pub fn load_buffer<P: AsRef<Path>>(
    path: P,
    format: &ContainerFormat,
    cancel: &CancelToken,
) -> Result<Buffer> {
    let data = fs::read(&path)?;
    if format.matches(&data) {
        debug!("{:?} is a save container", path.as_ref());
        RawFile::from_bytes(data, format, cancel)?.decompress_largest_frame()
    } else {
        debug!("{:?} is a raw buffer", path.as_ref());
        Ok(Buffer::new(data))
    }
}
