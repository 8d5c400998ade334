//! Hex dumps of buffer regions for manual inspection.

use serde::Serialize;

use crate::buffer::Buffer;
use crate::locator::Anchor;

const BYTES_PER_LINE: usize = 16;

/// A region of a buffer rendered as hex lines.
#[derive(Debug, Clone, Serialize)]
pub struct RegionDump {
    pub start: usize,
    pub size: usize,
    /// Anchor the `rel` column is measured from, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub anchor: Option<usize>,
    pub hex_dump: Vec<String>,
}

impl RegionDump {
    pub fn new(start: usize, bytes: &[u8], anchor: Option<usize>) -> Self {
        Self {
            start,
            size: bytes.len(),
            anchor,
            hex_dump: format_hex_dump(start, bytes, anchor),
        }
    }

    /// Dump `radius` bytes either side of an anchor's string payload.
    pub fn around_anchor(buffer: &Buffer, anchor: &Anchor, radius: usize) -> Self {
        let (start, bytes) = anchor.context(buffer, radius);
        Self::new(start, bytes, Some(anchor.absolute_offset))
    }
}

/// Render `bytes` as `offset  [rel]  hex  ascii` lines, 16 bytes per line.
///
/// With an anchor, each line also shows its signed offset relative to it,
/// which is the number the schema uses.
pub fn format_hex_dump(start: usize, bytes: &[u8], anchor: Option<usize>) -> Vec<String> {
    bytes
        .chunks(BYTES_PER_LINE)
        .enumerate()
        .map(|(i, chunk)| {
            let offset = start + i * BYTES_PER_LINE;
            let hex_part = chunk
                .iter()
                .map(|b| format!("{:02X}", b))
                .collect::<Vec<_>>()
                .join(" ");
            let ascii_part: String = chunk
                .iter()
                .map(|&b| if (0x20..0x7F).contains(&b) { b as char } else { '.' })
                .collect();

            match anchor {
                Some(anchor) => {
                    let rel = offset as i64 - anchor as i64;
                    format!("{:010X}  {:+7}  {:47}  {}", offset, rel, hex_part, ascii_part)
                }
                None => format!("{:010X}  {:47}  {}", offset, hex_part, ascii_part),
            }
        })
        .collect()
}
