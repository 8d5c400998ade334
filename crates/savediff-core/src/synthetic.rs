//! Synthetic save fixtures for tests.
//!
//! Provides fluent builders for decompressed buffers and for whole save
//! containers, so tests can place known bytes at known offsets without a
//! real save file.

use crate::buffer::{Buffer, ByteWidth};
use crate::container::ContainerFormat;

/// Builder for decompressed database buffers.
#[derive(Debug, Clone, Default)]
pub struct SyntheticBufferBuilder {
    data: Vec<u8>,
}

impl SyntheticBufferBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-allocate the buffer with `fill` up to `size` bytes.
    pub fn with_size(mut self, size: usize, fill: u8) -> Self {
        self.data.resize(size, fill);
        self
    }

    pub fn write_u8(mut self, offset: usize, value: u8) -> Self {
        self.ensure_size(offset + 1);
        self.data[offset] = value;
        self
    }

    pub fn write_u16(mut self, offset: usize, value: u16) -> Self {
        self.write_slice(offset, &value.to_le_bytes());
        self
    }

    pub fn write_i16(mut self, offset: usize, value: i16) -> Self {
        self.write_slice(offset, &value.to_le_bytes());
        self
    }

    pub fn write_bytes(mut self, offset: usize, bytes: &[u8]) -> Self {
        self.write_slice(offset, bytes);
        self
    }

    /// Write `<len as width LE><text>` with the prefix starting at `offset`.
    pub fn write_prefixed_str(mut self, offset: usize, text: &str, width: ByteWidth) -> Self {
        let len = text.len() as u64;
        let prefix = len.to_le_bytes();
        self.write_slice(offset, &prefix[..width.bytes()]);
        self.write_slice(offset + width.bytes(), text.as_bytes());
        self
    }

    pub fn build(self) -> Buffer {
        Buffer::new(self.data)
    }

    fn write_slice(&mut self, offset: usize, bytes: &[u8]) {
        self.ensure_size(offset + bytes.len());
        self.data[offset..offset + bytes.len()].copy_from_slice(bytes);
    }

    fn ensure_size(&mut self, size: usize) {
        if self.data.len() < size {
            self.data.resize(size, 0);
        }
    }
}

enum Segment {
    Compressed(Vec<u8>),
    Raw(Vec<u8>),
}

/// Builder for whole save files: header plus zstd frames.
pub struct SyntheticContainer {
    format: ContainerFormat,
    version: u8,
    segments: Vec<Segment>,
}

impl Default for SyntheticContainer {
    fn default() -> Self {
        Self::new()
    }
}

impl SyntheticContainer {
    pub fn new() -> Self {
        Self {
            format: ContainerFormat::default(),
            version: 1,
            segments: Vec::new(),
        }
    }

    pub fn format(mut self, format: ContainerFormat) -> Self {
        self.format = format;
        self
    }

    pub fn version(mut self, version: u8) -> Self {
        self.version = version;
        self
    }

    /// Append a frame holding `plaintext` compressed with zstd.
    pub fn frame(mut self, plaintext: Vec<u8>) -> Self {
        self.segments.push(Segment::Compressed(plaintext));
        self
    }

    /// Append bytes verbatim after the previous segment.
    pub fn raw(mut self, bytes: Vec<u8>) -> Self {
        self.segments.push(Segment::Raw(bytes));
        self
    }

    pub fn build(self) -> Vec<u8> {
        let mut data = Vec::new();
        data.extend_from_slice(&self.format.magic_prefix.to_le_bytes());
        data.extend_from_slice(&self.format.signature);
        data.push(self.version);
        data.resize(self.format.effective_header_len(), 0);

        for segment in self.segments {
            match segment {
                Segment::Compressed(plaintext) => {
                    let compressed = zstd::bulk::compress(&plaintext, 3)
                        .unwrap_or_else(|e| panic!("zstd compression failed: {}", e));
                    data.extend_from_slice(&compressed);
                }
                Segment::Raw(bytes) => data.extend_from_slice(&bytes),
            }
        }

        data
    }
}
