use std::{fmt, ops};

/// Roles in the QUIC protocol, including client and server.
///
/// The role decides how alternate connection IDs are managed: only the server
/// accepts inbound connections, so only the server registers its issued
/// connection IDs in the packet routing table, while only the client rotates
/// all of its issued connection IDs before migrating to a new path.
///
/// # Example
///
/// ```
/// use qbase::role::Role;
///
/// let local = Role::Client;
/// let peer = !local;
/// assert!(local.is_initiator());
/// assert_eq!(peer.to_string(), "server");
/// ```
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum Role {
    /// The initiator of a connection
    Client = 0,
    /// The acceptor of a connection
    Server = 1,
}

impl Role {
    pub fn is_initiator(&self) -> bool {
        matches!(self, Self::Client)
    }

    pub fn is_acceptor(&self) -> bool {
        matches!(self, Self::Server)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(match *self {
            Self::Client => "client",
            Self::Server => "server",
        })
    }
}

impl ops::Not for Role {
    type Output = Self;
    fn not(self) -> Self {
        match self {
            Self::Client => Self::Server,
            Self::Server => Self::Client,
        }
    }
}
