//! Byte pattern search over decompressed buffers.

use crate::buffer::ByteWidth;

/// Find all (possibly overlapping) matches of `pattern` in `data`.
pub fn find_all_matches(data: &[u8], pattern: &[u8]) -> Vec<usize> {
    if pattern.is_empty() || data.len() < pattern.len() {
        return Vec::new();
    }

    let first = pattern[0];
    data.windows(pattern.len())
        .enumerate()
        .filter(|(_, window)| window[0] == first && *window == pattern)
        .map(|(pos, _)| pos)
        .collect()
}

/// Encode `len` as a little-endian prefix of `width`, if it fits.
pub fn encode_length_prefix(len: usize, width: ByteWidth) -> Option<Vec<u8>> {
    let len = len as u64;
    if len > width.max_unsigned() {
        return None;
    }
    Some(len.to_le_bytes()[..width.bytes()].to_vec())
}

/// Build `<prefix><key bytes>` for a length-prefixed string.
pub fn length_prefixed_pattern(key: &str, width: ByteWidth) -> Option<Vec<u8>> {
    let mut pattern = encode_length_prefix(key.len(), width)?;
    pattern.extend_from_slice(key.as_bytes());
    Some(pattern)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_all_matches() {
        let data = [0xAB, 0xCD, 0x00, 0xAB, 0xCD, 0xAB, 0xCD];
        assert_eq!(find_all_matches(&data, &[0xAB, 0xCD]), vec![0, 3, 5]);
    }

    #[test]
    fn test_find_all_matches_overlapping() {
        let data = [0x01, 0x01, 0x01];
        assert_eq!(find_all_matches(&data, &[0x01, 0x01]), vec![0, 1]);
    }

    #[test]
    fn test_encode_length_prefix() {
        assert_eq!(encode_length_prefix(5, ByteWidth::One), Some(vec![5]));
        assert_eq!(encode_length_prefix(5, ByteWidth::Two), Some(vec![5, 0]));
        assert_eq!(encode_length_prefix(300, ByteWidth::Two), Some(vec![0x2C, 0x01]));
        assert_eq!(encode_length_prefix(300, ByteWidth::One), None);
    }

    #[test]
    fn test_length_prefixed_pattern() {
        assert_eq!(
            length_prefixed_pattern("Ann", ByteWidth::Four),
            Some(vec![3, 0, 0, 0, b'A', b'n', b'n'])
        );
    }
}
