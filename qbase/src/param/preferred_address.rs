use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr, SocketAddrV4, SocketAddrV6};

use getset::CopyGetters;

use crate::{
    cid::{ConnectionId, WriteConnectionId},
    token::{ResetToken, WriteResetToken},
};

/// The server's preferred address, which is used to effect
/// a change in server address at the end of the handshake.
///
/// The connection ID bound here is only ever advertised through this
/// transport parameter, never through a NEW_CONNECTION_ID frame.
///
/// See [section-18.2-4.31](https://datatracker.ietf.org/doc/html/rfc9000#section-18.2-4.32)
/// and [figure-22](https://datatracker.ietf.org/doc/html/rfc9000#figure-22)
/// for more details.
#[derive(CopyGetters, Debug, PartialEq, Eq, Clone, Copy)]
#[getset(get_copy = "pub")]
pub struct PreferredAddress {
    address_v4: SocketAddrV4,
    address_v6: SocketAddrV6,
    connection_id: ConnectionId,
    stateless_reset_token: ResetToken,
}

impl PreferredAddress {
    pub fn new(
        address_v4: SocketAddrV4,
        address_v6: SocketAddrV6,
        connection_id: ConnectionId,
        stateless_reset_token: ResetToken,
    ) -> Self {
        Self {
            address_v4,
            address_v6,
            connection_id,
            stateless_reset_token,
        }
    }

    /// Bind a single local endpoint, the other address family is left unspecified
    /// (all zeros), which tells the client that family is not offered.
    pub fn from_endpoint(
        endpoint: SocketAddr,
        connection_id: ConnectionId,
        stateless_reset_token: ResetToken,
    ) -> Self {
        let unspecified_v4 = SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, 0);
        let unspecified_v6 = SocketAddrV6::new(Ipv6Addr::UNSPECIFIED, 0, 0, 0);
        let (address_v4, address_v6) = match endpoint {
            SocketAddr::V4(v4) => (v4, unspecified_v6),
            SocketAddr::V6(v6) => (unspecified_v4, v6),
        };
        Self::new(address_v4, address_v6, connection_id, stateless_reset_token)
    }

    /// Returns the encoding size of the preferred address.
    pub fn encoding_size(&self) -> usize {
        6 + 18 + self.connection_id.encoding_size() + self.stateless_reset_token.encoding_size()
    }
}

/// A [`bytes::BufMut`] extension trait, makes buffer more friendly
/// to write the preferred address.
pub trait WritePreferredAddress: bytes::BufMut {
    fn put_preferred_address(&mut self, addr: &PreferredAddress);
}

impl<T: bytes::BufMut> WritePreferredAddress for T {
    fn put_preferred_address(&mut self, addr: &PreferredAddress) {
        self.put_slice(&addr.address_v4.ip().octets());
        self.put_u16(addr.address_v4.port());

        self.put_slice(&addr.address_v6.ip().octets());
        self.put_u16(addr.address_v6.port());

        self.put_connection_id(&addr.connection_id);
        self.put_reset_token(&addr.stateless_reset_token);
    }
}
