//! Fixed save header layout.
//!
//! ```text
//! offset  size  field
//! 0x00    2     magic prefix (u16 LE, 0x0103)
//! 0x02    4     signature ("fmf.")
//! 0x06    1     version
//! 0x07    ..    reserved up to header_len
//! ```

use serde::{Deserialize, Serialize};

use crate::buffer::ByteReader;
use crate::error::{ContainerError, Result};

/// Zstandard frame magic, little-endian `0xFD2FB528`.
pub const ZSTD_FRAME_MAGIC: [u8; 4] = [0x28, 0xB5, 0x2F, 0xFD];

/// Default decompression chunk (16 MiB).
pub const DEFAULT_CHUNK_SIZE: usize = 16 * 1024 * 1024;

/// Bytes covered by the magic prefix, signature and version byte.
const FIXED_FIELDS_LEN: usize = 7;

/// Layout constants of the container, overridable from config.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContainerFormat {
    pub magic_prefix: u16,
    pub signature: [u8; 4],
    pub header_len: usize,
    pub frame_magic: [u8; 4],
    pub chunk_size: usize,
}

impl Default for ContainerFormat {
    fn default() -> Self {
        Self {
            magic_prefix: 0x0103,
            signature: *b"fmf.",
            header_len: 26,
            frame_magic: ZSTD_FRAME_MAGIC,
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

impl ContainerFormat {
    /// Header length actually used, never shorter than the fixed fields.
    pub fn effective_header_len(&self) -> usize {
        self.header_len.max(FIXED_FIELDS_LEN)
    }

    /// Whether `data` starts with this format's prefix and signature.
    pub fn matches(&self, data: &[u8]) -> bool {
        data.len() >= FIXED_FIELDS_LEN
            && data[..2] == self.magic_prefix.to_le_bytes()
            && data[2..6] == self.signature
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SaveHeader {
    pub magic_prefix: u16,
    pub signature: [u8; 4],
    pub version: u8,
}

impl SaveHeader {
    pub fn signature_str(&self) -> String {
        printable(&self.signature)
    }
}

/// Parse and validate the fixed header at the start of a save file.
pub fn parse_header(data: &[u8], format: &ContainerFormat) -> Result<SaveHeader> {
    let header_len = format.effective_header_len();
    if data.len() < header_len {
        return Err(ContainerError::TruncatedHeader {
            expected: header_len,
            actual: data.len(),
        }
        .into());
    }

    let mut reader = ByteReader::new(data);
    let magic_prefix = reader.read_u16()?;
    let signature_bytes = reader.read_bytes(4)?;
    let version = reader.read_u8()?;

    if magic_prefix != format.magic_prefix || signature_bytes != format.signature {
        return Err(ContainerError::InvalidSignature {
            expected: format!(
                "{:04X} {:?}",
                format.magic_prefix,
                printable(&format.signature)
            ),
            found: format!("{:04X} {:?}", magic_prefix, printable(signature_bytes)),
        }
        .into());
    }

    let mut signature = [0u8; 4];
    signature.copy_from_slice(signature_bytes);

    Ok(SaveHeader {
        magic_prefix,
        signature,
        version,
    })
}

fn printable(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|&b| if (0x20..0x7F).contains(&b) { b as char } else { '.' })
        .collect()
}
