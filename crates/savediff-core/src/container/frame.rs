//! Frame discovery by magic-marker scanning.
//!
//! The container has no frame directory. Every occurrence of the frame magic
//! after the header starts a new frame, and a frame extends to the next
//! occurrence or to end of file. A compressed payload that happens to contain
//! the magic is therefore split in two; the tail half is reported as its own
//! frame and will not decompress.

use serde::Serialize;
use tracing::debug;

use crate::cancel::CancelToken;
use crate::error::{ContainerError, Result};

/// Distance between cancellation checks while scanning (1 MiB).
const CANCEL_CHECK_INTERVAL: usize = 1024 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FrameDescriptor {
    pub start_offset: usize,
    pub byte_length: usize,
    pub index: u32,
}

impl FrameDescriptor {
    pub fn end_offset(&self) -> usize {
        self.start_offset + self.byte_length
    }
}

/// Find every marker position in `data[from..]`.
pub fn find_markers(
    data: &[u8],
    from: usize,
    marker: &[u8],
    cancel: &CancelToken,
) -> Result<Vec<usize>> {
    let mut positions = Vec::new();
    if marker.is_empty() || data.len() < marker.len() || from > data.len() - marker.len() {
        return Ok(positions);
    }

    let last = data.len() - marker.len();
    let mut pos = from;
    while pos <= last {
        if (pos - from) % CANCEL_CHECK_INTERVAL == 0 {
            cancel.check()?;
        }
        if data[pos] == marker[0] && &data[pos..pos + marker.len()] == marker {
            positions.push(pos);
        }
        pos += 1;
    }

    Ok(positions)
}

/// Split the body after `header_len` into frame descriptors.
pub fn scan_frames(
    data: &[u8],
    header_len: usize,
    marker: &[u8],
    cancel: &CancelToken,
) -> Result<Vec<FrameDescriptor>> {
    let starts = find_markers(data, header_len, marker, cancel)?;
    if starts.is_empty() {
        return Err(ContainerError::NoFramesFound.into());
    }

    let frames: Vec<FrameDescriptor> = starts
        .iter()
        .enumerate()
        .map(|(i, &start)| {
            let end = starts.get(i + 1).copied().unwrap_or(data.len());
            FrameDescriptor {
                start_offset: start,
                byte_length: end - start,
                index: i as u32,
            }
        })
        .collect();

    if starts[0] != header_len {
        debug!(
            "{} bytes between header and first frame marker",
            starts[0] - header_len
        );
    }
    debug!("Discovered {} frames", frames.len());
    Ok(frames)
}

/// The frame with the greatest compressed length; first one wins ties.
pub fn largest_frame(frames: &[FrameDescriptor]) -> Option<&FrameDescriptor> {
    frames
        .iter()
        .reduce(|best, f| if f.byte_length > best.byte_length { f } else { best })
}
