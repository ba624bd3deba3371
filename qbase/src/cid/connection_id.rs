use std::fmt;

use rand::Rng;

/// The longest connection ID allowed by QUIC version 1.
pub const MAX_CID_SIZE: usize = 20;

/// An opaque connection ID of at most [`MAX_CID_SIZE`] bytes.
///
/// A zero-length connection ID is representable, because the peer may choose not to
/// use connection IDs at all, but it can never be advertised as an alternate one.
#[derive(Clone, Copy, Eq, PartialEq, Hash, Default)]
pub struct ConnectionId {
    pub(crate) len: u8,
    pub(crate) bytes: [u8; MAX_CID_SIZE],
}

impl ConnectionId {
    /// Create a connection ID from a slice.
    ///
    /// # Panics
    ///
    /// Panics if the slice is longer than [`MAX_CID_SIZE`].
    pub fn from_slice(bytes: &[u8]) -> Self {
        assert!(bytes.len() <= MAX_CID_SIZE);
        let mut res = Self {
            len: bytes.len() as u8,
            bytes: [0; MAX_CID_SIZE],
        };
        res.bytes[..bytes.len()].copy_from_slice(bytes);
        res
    }

    /// Generate a random connection ID of the given length.
    /// The cid maybe not unique, so it should be checked before use.
    pub fn random_gen(len: usize) -> Self {
        debug_assert!(len <= MAX_CID_SIZE);
        let mut bytes = [0; MAX_CID_SIZE];
        rand::rng().fill(&mut bytes[..len]);
        Self {
            len: len as u8,
            bytes,
        }
    }

    /// Number of bytes needed to encode this connection ID with its length prefix.
    pub fn encoding_size(&self) -> usize {
        1 + self.len as usize
    }
}

impl std::ops::Deref for ConnectionId {
    type Target = [u8];

    fn deref(&self) -> &Self::Target {
        &self.bytes[0..self.len as usize]
    }
}

impl fmt::LowerHex for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.iter().try_for_each(|b| write!(f, "{b:02x}"))
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:x}")
    }
}

impl fmt::Debug for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ConnectionId({self:x})")
    }
}

/// A [`bytes::BufMut`] extension trait, writes a connection ID with its length prefix.
pub trait WriteConnectionId {
    fn put_connection_id(&mut self, cid: &ConnectionId);
}

impl<T: bytes::BufMut> WriteConnectionId for T {
    fn put_connection_id(&mut self, cid: &ConnectionId) {
        self.put_u8(cid.len);
        self.put_slice(cid);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[should_panic]
    fn test_cid_from_large_slice() {
        ConnectionId::from_slice(&[0; MAX_CID_SIZE + 1]);
    }

    #[test]
    fn test_random_gen() {
        let cid = ConnectionId::random_gen(8);
        assert_eq!(cid.len(), 8);
        assert_eq!(cid.encoding_size(), 9);
        assert!(ConnectionId::random_gen(0).is_empty());
    }

    #[test]
    fn test_hex_format() {
        let cid = ConnectionId::from_slice(&[0xaa, 0x01, 0xff]);
        assert_eq!(cid.to_string(), "aa01ff");
        assert_eq!(format!("{cid:?}"), "ConnectionId(aa01ff)");
    }

    #[test]
    fn test_write_connection_id() {
        let mut buf = Vec::new();
        let cid = ConnectionId::from_slice(&[0x01, 0x02, 0x03, 0x04]);
        buf.put_connection_id(&cid);
        assert_eq!(buf, [0x04, 0x01, 0x02, 0x03, 0x04]);
    }
}
