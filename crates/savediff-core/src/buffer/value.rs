//! Integer widths and tagged raw values decoded from save buffers.

use serde::{Deserialize, Serialize};
use strum::{FromRepr, IntoStaticStr};

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    FromRepr,
)]
#[repr(u8)]
#[serde(into = "u8", try_from = "u8")]
pub enum ByteWidth {
    One = 1,
    Two = 2,
    Four = 4,
}

impl ByteWidth {
    pub const ALL: [ByteWidth; 3] = [ByteWidth::One, ByteWidth::Two, ByteWidth::Four];

    pub fn bytes(self) -> usize {
        self as usize
    }

    pub fn from_bytes(bytes: usize) -> Option<Self> {
        u8::try_from(bytes).ok().and_then(Self::from_repr)
    }

    /// Largest length a prefix of this width can encode.
    pub fn max_unsigned(self) -> u64 {
        match self {
            ByteWidth::One => u8::MAX as u64,
            ByteWidth::Two => u16::MAX as u64,
            ByteWidth::Four => u32::MAX as u64,
        }
    }
}

impl From<ByteWidth> for u8 {
    fn from(width: ByteWidth) -> Self {
        width as u8
    }
}

impl TryFrom<u8> for ByteWidth {
    type Error = String;

    fn try_from(value: u8) -> std::result::Result<Self, Self::Error> {
        Self::from_repr(value).ok_or_else(|| format!("unsupported byte width {}", value))
    }
}

impl std::fmt::Display for ByteWidth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.bytes())
    }
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Default,
    Serialize,
    Deserialize,
    IntoStaticStr,
)]
#[serde(rename_all = "lowercase")]
pub enum Signedness {
    #[default]
    #[strum(serialize = "unsigned")]
    Unsigned,
    #[strum(serialize = "signed")]
    Signed,
}

impl Signedness {
    pub fn as_str(&self) -> &'static str {
        self.into()
    }
}

/// An integer tagged with the width and signedness it was decoded with.
///
/// Two raw values only compare equal when all three parts agree, so a 1-byte
/// `50` never matches a 2-byte `50`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RawValue {
    pub value: i64,
    pub width: ByteWidth,
    pub signedness: Signedness,
}

impl RawValue {
    pub fn new(value: i64, width: ByteWidth, signedness: Signedness) -> Self {
        Self {
            value,
            width,
            signedness,
        }
    }

    /// Build a raw value only if `value` is representable in `width`.
    pub fn checked(value: i64, width: ByteWidth, signedness: Signedness) -> Option<Self> {
        let (min, max) = value_range(width, signedness);
        (min..=max)
            .contains(&value)
            .then(|| Self::new(value, width, signedness))
    }

    /// Decode a little-endian integer from exactly `width` bytes.
    pub fn decode(bytes: &[u8], width: ByteWidth, signedness: Signedness) -> Option<Self> {
        let bytes = bytes.get(..width.bytes())?;
        let value = match (width, signedness) {
            (ByteWidth::One, Signedness::Unsigned) => bytes[0] as i64,
            (ByteWidth::One, Signedness::Signed) => bytes[0] as i8 as i64,
            (ByteWidth::Two, Signedness::Unsigned) => u16::from_le_bytes([bytes[0], bytes[1]]) as i64,
            (ByteWidth::Two, Signedness::Signed) => i16::from_le_bytes([bytes[0], bytes[1]]) as i64,
            (ByteWidth::Four, Signedness::Unsigned) => {
                u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) as i64
            }
            (ByteWidth::Four, Signedness::Signed) => {
                i32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) as i64
            }
        };
        Some(Self::new(value, width, signedness))
    }
}

impl std::fmt::Display for RawValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let prefix = match self.signedness {
            Signedness::Unsigned => 'u',
            Signedness::Signed => 'i',
        };
        write!(f, "{}{}:{}", prefix, self.width.bytes() * 8, self.value)
    }
}

fn value_range(width: ByteWidth, signedness: Signedness) -> (i64, i64) {
    match (width, signedness) {
        (ByteWidth::One, Signedness::Unsigned) => (0, u8::MAX as i64),
        (ByteWidth::One, Signedness::Signed) => (i8::MIN as i64, i8::MAX as i64),
        (ByteWidth::Two, Signedness::Unsigned) => (0, u16::MAX as i64),
        (ByteWidth::Two, Signedness::Signed) => (i16::MIN as i64, i16::MAX as i64),
        (ByteWidth::Four, Signedness::Unsigned) => (0, u32::MAX as i64),
        (ByteWidth::Four, Signedness::Signed) => (i32::MIN as i64, i32::MAX as i64),
    }
}
