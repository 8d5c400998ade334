//! Position-tracking little-endian reader used for fixed-layout headers.

use crate::error::{Error, Result};

/// A position-tracking byte reader over a borrowed slice.
///
/// # Example
///
/// ```
/// use savediff_core::buffer::ByteReader;
///
/// let data = [0x03, 0x01, b'f', b'm', b'f', b'.'];
/// let mut reader = ByteReader::new(&data);
///
/// assert_eq!(reader.read_u16().unwrap(), 0x0103);
/// assert_eq!(reader.read_bytes(4).unwrap(), b"fmf.");
/// assert_eq!(reader.position(), 6);
/// ```
pub struct ByteReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.pos)
    }

    pub fn skip(&mut self, count: usize) -> Result<()> {
        self.read_bytes(count).map(|_| ())
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        let bytes = self.read_bytes(1)?;
        Ok(bytes[0])
    }

    pub fn read_u16(&mut self) -> Result<u16> {
        let bytes = self.read_bytes(2)?;
        Ok(u16::from_le_bytes([bytes[0], bytes[1]]))
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        let bytes = self.read_bytes(4)?;
        Ok(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    /// Reads `count` bytes and advances the position.
    ///
    /// # Errors
    ///
    /// Returns an error if there are not enough bytes remaining.
    pub fn read_bytes(&mut self, count: usize) -> Result<&'a [u8]> {
        let end = self
            .pos
            .checked_add(count)
            .ok_or_else(|| Error::ReadOutOfBounds {
                offset: self.pos,
                message: "Position overflow".to_string(),
            })?;

        if end > self.data.len() {
            return Err(Error::ReadOutOfBounds {
                offset: self.pos,
                message: format!(
                    "Read of {} bytes exceeds buffer length {}",
                    count,
                    self.data.len()
                ),
            });
        }

        let result = &self.data[self.pos..end];
        self.pos = end;
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sequential_reads() {
        let data = [0x01, 0x00, 0x02, 0x00, 0x00, 0x00, 0x07];
        let mut reader = ByteReader::new(&data);

        assert_eq!(reader.read_u16().unwrap(), 1);
        assert_eq!(reader.read_u32().unwrap(), 2);
        assert_eq!(reader.read_u8().unwrap(), 7);
        assert_eq!(reader.remaining(), 0);
    }

    #[test]
    fn test_overflow_error() {
        let data = [0x01, 0x02];
        let mut reader = ByteReader::new(&data);

        assert!(reader.read_u32().is_err());
        // A failed read does not move the cursor
        assert_eq!(reader.position(), 0);
    }

    #[test]
    fn test_skip() {
        let data = [0x01, 0x02, 0x03, 0x04];
        let mut reader = ByteReader::new(&data);

        reader.skip(3).unwrap();
        assert_eq!(reader.read_u8().unwrap(), 0x04);
        assert!(reader.skip(1).is_err());
    }
}
