use getset::CopyGetters;

use super::ConnectionId;
use crate::{
    error::{Error, ErrorKind},
    frame::{BeFrame, NewConnectionIdFrame},
    param::PreferredAddress,
    token::ResetToken,
};

/// A connection ID issued by the peer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, CopyGetters)]
#[getset(get_copy = "pub")]
pub struct RemoteCid {
    sequence: u64,
    id: ConnectionId,
    /// Absent only for the initial connection ID, which comes without a token.
    reset_token: Option<ResetToken>,
    /// Whether it has been chosen as the destination of a migration,
    /// the initial connection ID is in use from the very beginning.
    used: bool,
}

/// The connection IDs issued by the peer, in the order they arrived.
#[derive(Debug)]
pub(super) struct RemoteCids(Vec<RemoteCid>);

impl RemoteCids {
    pub(super) fn new(
        initial_dcid: ConnectionId,
        preferred_address: Option<&PreferredAddress>,
    ) -> Self {
        let mut cids = vec![RemoteCid {
            sequence: 0,
            id: initial_dcid,
            reset_token: None,
            used: true,
        }];
        // The connection ID bound to the server's preferred address has sequence number 1.
        if let Some(preferred_address) = preferred_address {
            cids.push(RemoteCid {
                sequence: 1,
                id: preferred_address.connection_id(),
                reset_token: Some(preferred_address.stateless_reset_token()),
                used: false,
            });
        }
        Self(cids)
    }

    pub(super) fn iter(&self) -> impl Iterator<Item = &RemoteCid> {
        self.0.iter()
    }

    pub(super) fn recv_new_cid_frame(&mut self, frame: &NewConnectionIdFrame) -> Result<(), Error> {
        if frame.id.is_empty() {
            return Err(Error::new(
                ErrorKind::ProtocolViolation,
                frame.frame_type(),
                "received zero-length cid",
            ));
        }

        let sequence = frame.sequence.into_inner();
        if self.0.iter().any(|cid| cid.sequence == sequence) {
            tracing::warn!(seq = sequence, cid = %frame.id, "peer reused a connection id sequence number");
        }
        self.0.push(RemoteCid {
            sequence,
            id: frame.id,
            reset_token: Some(frame.reset_token),
            used: false,
        });
        Ok(())
    }

    pub(super) fn has_unused(&self) -> bool {
        self.0.iter().any(|cid| !cid.used)
    }

    /// Pick the earliest arrived connection ID which has not been used, and mark it used.
    pub(super) fn select_unused(&mut self) -> Option<RemoteCid> {
        let cid = self.0.iter_mut().find(|cid| !cid.used)?;
        cid.used = true;
        Some(*cid)
    }

    pub(super) fn remove(&mut self, id: &ConnectionId) -> Option<RemoteCid> {
        let idx = self.0.iter().position(|cid| cid.id == *id)?;
        Some(self.0.remove(idx))
    }
}
