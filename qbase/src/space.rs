use std::fmt;

/// Packet number spaces, one per encryption level a frame can be carried in.
///
/// 0-RTT and 1-RTT packets share the application data space for packet numbers,
/// but they are protected by different keys and permit different frames, so
/// they are distinguished here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpaceId {
    Initial,
    Handshake,
    ZeroRtt,
    OneRtt,
}

impl fmt::Display for SpaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(match self {
            Self::Initial => "initial",
            Self::Handshake => "handshake",
            Self::ZeroRtt => "0rtt",
            Self::OneRtt => "1rtt",
        })
    }
}

bitflags::bitflags! {
    /// A set of [`SpaceId`]s, e.g. the spaces allowed to carry some kind of frames.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Spaces: u8 {
        const INITIAL   = 1 << 0;
        const HANDSHAKE = 1 << 1;
        const ZERO_RTT  = 1 << 2;
        const ONE_RTT   = 1 << 3;
    }
}

impl From<SpaceId> for Spaces {
    fn from(space: SpaceId) -> Self {
        match space {
            SpaceId::Initial => Spaces::INITIAL,
            SpaceId::Handshake => Spaces::HANDSHAKE,
            SpaceId::ZeroRtt => Spaces::ZERO_RTT,
            SpaceId::OneRtt => Spaces::ONE_RTT,
        }
    }
}

impl Spaces {
    pub fn contains_space(&self, space: SpaceId) -> bool {
        self.contains(space.into())
    }
}
