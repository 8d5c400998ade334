//! Decompressed save buffers and little-endian value decoding.

mod reader;
mod value;

use std::fs;
use std::ops::Deref;
use std::path::Path;

use tracing::debug;

use crate::error::Result;

pub use reader::ByteReader;
pub use value::{ByteWidth, RawValue, Signedness};

/// One fully decompressed game database.
///
/// Produced once and only ever read afterwards; every comparison in the
/// inference engine is a read-only scan over two of these.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Buffer {
    data: Vec<u8>,
}

impl Buffer {
    pub fn new(data: Vec<u8>) -> Self {
        Self { data }
    }

    /// Read a previously saved buffer from disk.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let data = fs::read(&path)?;
        debug!(
            "Loaded buffer {:?} ({} bytes)",
            path.as_ref(),
            data.len()
        );
        Ok(Self { data })
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        fs::write(path, &self.data)?;
        Ok(())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Decode the integer at `offset`, or `None` if it runs past the end.
    pub fn read_value(
        &self,
        offset: usize,
        width: ByteWidth,
        signedness: Signedness,
    ) -> Option<RawValue> {
        let end = offset.checked_add(width.bytes())?;
        RawValue::decode(self.data.get(offset..end)?, width, signedness)
    }

    /// Decode the integer at `anchor + relative`, skipping negative or
    /// out-of-range positions.
    pub fn read_relative(
        &self,
        anchor: usize,
        relative: i64,
        width: ByteWidth,
        signedness: Signedness,
    ) -> Option<RawValue> {
        let offset = offset_from(anchor, relative)?;
        self.read_value(offset, width, signedness)
    }
}

impl Deref for Buffer {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.data
    }
}

impl From<Vec<u8>> for Buffer {
    fn from(data: Vec<u8>) -> Self {
        Self::new(data)
    }
}

/// Apply a signed relative offset to an absolute position.
pub fn offset_from(anchor: usize, relative: i64) -> Option<usize> {
    let anchor = i64::try_from(anchor).ok()?;
    usize::try_from(anchor.checked_add(relative)?).ok()
}
