use std::fmt;

use bytes::BufMut;

/// An integer less than 2^62, the value range of QUIC variable-length integers.
///
/// Sequence numbers of connection IDs travel in this encoding, so the size of a
/// NEW_CONNECTION_ID or RETIRE_CONNECTION_ID frame depends on how large the
/// sequence number has grown.
///
/// See [variable-length integers](https://www.rfc-editor.org/rfc/rfc9000.html#name-variable-length-integer-enc)
/// of [QUIC](https://www.rfc-editor.org/rfc/rfc9000.html) for more details.
#[derive(Default, Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct VarInt(u64);

/// The maximum value that can be represented by a QUIC variable-length integer.
pub const VARINT_MAX: u64 = 0x3fff_ffff_ffff_ffff;

impl VarInt {
    /// The largest representable value
    pub const MAX: Self = Self(VARINT_MAX);

    /// Construct a `VarInt` from a [`u32`], which always fits.
    pub const fn from_u32(x: u32) -> Self {
        Self(x as u64)
    }

    /// Construct a `VarInt` from a [`u64`].
    /// Succeeds if `x` <= [`VARINT_MAX`].
    pub fn from_u64(x: u64) -> Result<Self, err::Overflow> {
        if x <= VARINT_MAX {
            Ok(Self(x))
        } else {
            Err(err::Overflow(x))
        }
    }

    /// Extract the integer value
    pub fn into_inner(self) -> u64 {
        self.0
    }

    /// Compute the number of bytes needed to encode this value
    pub fn encoding_size(self) -> usize {
        match self.0 {
            x if x < 1 << 6 => 1,
            x if x < 1 << 14 => 2,
            x if x < 1 << 30 => 4,
            _ => 8,
        }
    }
}

impl From<VarInt> for u64 {
    fn from(x: VarInt) -> Self {
        x.0
    }
}

impl From<u32> for VarInt {
    fn from(x: u32) -> Self {
        Self::from_u32(x)
    }
}

impl TryFrom<u64> for VarInt {
    type Error = err::Overflow;

    fn try_from(x: u64) -> Result<Self, Self::Error> {
        Self::from_u64(x)
    }
}

impl PartialEq<u64> for VarInt {
    fn eq(&self, other: &u64) -> bool {
        self.0.eq(other)
    }
}

impl fmt::Display for VarInt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Error module for VarInt
pub mod err {
    use thiserror::Error;

    /// Overflow error indicating that a value exceeds [`VARINT_MAX`](super::VARINT_MAX)
    #[derive(Debug, Copy, Clone, Eq, PartialEq, Error)]
    #[error("value({0}) too large for varint encoding")]
    pub struct Overflow(pub(super) u64);
}

/// A [`bytes::BufMut`] extension trait, makes buffer more friendly to write VarInt.
pub trait WriteVarInt: BufMut {
    /// Write a variable-length integer on the smallest number of bytes.
    fn put_varint(&mut self, value: &VarInt);
}

impl<T: BufMut> WriteVarInt for T {
    fn put_varint(&mut self, value: &VarInt) {
        let x = value.0;
        match value.encoding_size() {
            1 => self.put_u8(x as u8),
            2 => self.put_u16((0b01 << 14) | x as u16),
            4 => self.put_u32((0b10 << 30) | x as u32),
            _ => self.put_u64((0b11 << 62) | x),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{VarInt, WriteVarInt, VARINT_MAX};

    fn assert_put_varint_eq(val: u64, expected: &[u8]) {
        let val = VarInt::from_u64(val).unwrap();
        let mut buf = vec![];
        buf.put_varint(&val);
        assert_eq!(buf, expected);
        assert_eq!(val.encoding_size(), expected.len());
    }

    #[test]
    fn test_put_varint() {
        assert_put_varint_eq(0x00, &[0]);
        assert_put_varint_eq(0x3F, &[0x3F]);
        assert_put_varint_eq(0x40, &[0x40, 0x40]);
        assert_put_varint_eq(0x3FFF, &[0x7F, 0xFF]);
        assert_put_varint_eq(0x4000, &[0x80, 0x00, 0x40, 0x00]);
        assert_put_varint_eq(0x3FFF_FFFF, &[0xBF, 0xFF, 0xFF, 0xFF]);
        assert_put_varint_eq(
            0x4000_0000,
            &[0xC0, 0x00, 0x00, 0x00, 0x40, 0x00, 0x00, 0x00],
        );
        assert_put_varint_eq(VARINT_MAX, &[0xFF; 8]);
    }

    #[test]
    fn test_overflow() {
        assert!(VarInt::from_u64(VARINT_MAX + 1).is_err());
        assert_eq!(VarInt::try_from(7u64), Ok(VarInt::from_u32(7)));
    }
}
