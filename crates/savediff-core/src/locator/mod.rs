//! Record anchoring via length-prefixed string search.
//!
//! Entity names are stored as `<len: uN LE><UTF-8 bytes>`, with N varying
//! between 1, 2 and 4 bytes across the database. An [`Anchor`] is the
//! position of the string payload (just after the prefix); all relative
//! offsets used by the inference engine are measured from it.

mod pattern;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::buffer::{Buffer, ByteWidth};
use crate::error::{Error, Result};

pub use pattern::{encode_length_prefix, find_all_matches, length_prefixed_pattern};

/// Prefix widths tried, in order.
pub const PREFIX_WIDTHS: [ByteWidth; 3] = ByteWidth::ALL;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Anchor {
    /// Start of the string payload; offset 0 for relative arithmetic.
    pub absolute_offset: usize,
    pub entity_key: String,
    pub prefix_width: ByteWidth,
}

impl Anchor {
    /// Position of the length prefix itself.
    pub fn prefix_offset(&self) -> usize {
        self.absolute_offset - self.prefix_width.bytes()
    }

    /// Bytes within `radius` of the anchor, clamped to the buffer, together
    /// with the absolute offset of the first returned byte.
    pub fn context<'a>(&self, buffer: &'a Buffer, radius: usize) -> (usize, &'a [u8]) {
        let start = self.absolute_offset.saturating_sub(radius);
        let end = self
            .absolute_offset
            .saturating_add(self.entity_key.len())
            .saturating_add(radius)
            .min(buffer.len());
        (start, &buffer[start.min(end)..end])
    }
}

/// How to pick one anchor when a key occurs several times.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnchorSelection {
    #[default]
    First,
    /// The n-th occurrence in buffer order.
    Index(usize),
    /// The occurrence closest to a known absolute offset.
    Nearest(usize),
}

/// Find every length-prefixed occurrence of `key`, for all prefix widths.
///
/// Results are sorted by offset. An empty key never matches.
pub fn find_anchors(buffer: &Buffer, key: &str) -> Vec<Anchor> {
    if key.is_empty() {
        return Vec::new();
    }

    let mut anchors: Vec<Anchor> = PREFIX_WIDTHS
        .iter()
        .filter_map(|&width| length_prefixed_pattern(key, width).map(|p| (width, p)))
        .flat_map(|(width, pattern)| {
            find_all_matches(buffer, &pattern)
                .into_iter()
                .map(move |pos| Anchor {
                    absolute_offset: pos + width.bytes(),
                    entity_key: key.to_string(),
                    prefix_width: width,
                })
        })
        .collect();

    anchors.sort_by_key(|a| (a.absolute_offset, a.prefix_width));
    anchors.dedup_by_key(|a| a.absolute_offset);

    debug!("Key {:?}: {} occurrence(s)", key, anchors.len());
    anchors
}

/// Find all plausible length-prefixed strings with `min_len..=max_len` bytes.
///
/// Returns `(payload_offset, text)` pairs sorted by offset. A candidate is
/// accepted only if its payload is valid UTF-8 made of printable or
/// whitespace characters.
pub fn find_all_length_prefixed(
    buffer: &Buffer,
    min_len: usize,
    max_len: usize,
) -> Vec<(usize, String)> {
    let min_len = min_len.max(1);
    let mut found = Vec::new();
    if min_len > max_len {
        return found;
    }

    for pos in 0..buffer.len() {
        for width in PREFIX_WIDTHS {
            let Some(len) = read_length(buffer, pos, width) else {
                continue;
            };
            if len < min_len || len > max_len {
                continue;
            }
            let start = pos + width.bytes();
            let Some(payload) = buffer.get(start..start + len) else {
                continue;
            };
            if let Some(text) = decode_printable(payload) {
                found.push((start, text));
            }
        }
    }

    found.sort();
    found.dedup();
    found
}

/// Pick one anchor according to `selection`.
pub fn select_anchor(anchors: &[Anchor], selection: AnchorSelection) -> Option<&Anchor> {
    match selection {
        AnchorSelection::First => anchors.first(),
        AnchorSelection::Index(n) => anchors.get(n),
        AnchorSelection::Nearest(target) => rank_by_distance(anchors, target).into_iter().next(),
    }
}

/// Anchors ordered by distance to `near`; equal distances keep buffer order.
pub fn rank_by_distance(anchors: &[Anchor], near: usize) -> Vec<&Anchor> {
    let mut ranked: Vec<&Anchor> = anchors.iter().collect();
    ranked.sort_by_key(|a| (a.absolute_offset.abs_diff(near), a.absolute_offset));
    ranked
}

/// Locate `key` and apply `selection`, failing with `AnchorNotFound`.
pub fn locate(buffer: &Buffer, key: &str, selection: AnchorSelection) -> Result<Anchor> {
    let anchors = find_anchors(buffer, key);
    select_anchor(&anchors, selection)
        .cloned()
        .ok_or_else(|| Error::anchor_not_found(key))
}

fn read_length(buffer: &Buffer, pos: usize, width: ByteWidth) -> Option<usize> {
    let bytes = buffer.get(pos..pos + width.bytes())?;
    let mut le = [0u8; 8];
    le[..bytes.len()].copy_from_slice(bytes);
    usize::try_from(u64::from_le_bytes(le)).ok()
}

fn decode_printable(payload: &[u8]) -> Option<String> {
    let text = std::str::from_utf8(payload).ok()?;
    text.chars()
        .all(|c| !c.is_control() || c.is_whitespace())
        .then(|| text.to_string())
}
