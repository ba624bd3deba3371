use std::{
    collections::VecDeque,
    net::SocketAddr,
    sync::{Arc, Mutex, MutexGuard},
};

use super::{
    CidExhausted, ConnectionId, LocalCid, RemoteCid, RouteCid, local_cid::LocalCids,
    remote_cid::RemoteCids,
};
use crate::{
    config::AltCidConfig,
    error::{Error, ErrorKind},
    frame::{
        BeFrame, ConnectionIdFrame, FrameType, NewConnectionIdFrame, ReceiveFrame,
        RetireConnectionIdFrame,
    },
    param::PreferredAddress,
    role::Role,
    space::SpaceId,
    token::{ResetToken, StatelessResetKey},
    varint::VarInt,
};

/// Alternate connection IDs of one connection, for both directions.
///
/// - Issues a fixed number of connection IDs to the peer, and replaces each one
///   the peer retires with a fresh one.
/// - Collects the connection IDs issued by the peer, from which the destination
///   connection ID of a migration is chosen.
/// - Queues the sequence numbers of the peer's connection IDs we no longer use,
///   each will be retired by a RETIRE_CONNECTION_ID frame.
///
/// Frames are produced one per [`AltCids::next_frame`] call, so that a single
/// large frame never takes the whole packet from other frame producers.
#[derive(Debug)]
pub struct AltCids<ROUTER> {
    config: AltCidConfig,
    local: LocalCids<ROUTER>,
    remote: RemoteCids,
    retired: VecDeque<u64>,
    preferred_address: Option<PreferredAddress>,
}

impl<ROUTER: RouteCid> AltCids<ROUTER> {
    /// Create the coordinator of a connection which learnt the server's preferred
    /// address, if any, from the transport parameters.
    ///
    /// Its own connection IDs are not generated until [`AltCids::populate`] is
    /// called or the connection migrates.
    pub fn with_peer_preferred_address(
        config: AltCidConfig,
        role: Role,
        reset_key: StatelessResetKey,
        router: ROUTER,
        initial_dcid: ConnectionId,
        preferred_address: Option<PreferredAddress>,
    ) -> Self {
        Self {
            config,
            local: LocalCids::new(&config, role, reset_key, router),
            remote: RemoteCids::new(initial_dcid, preferred_address.as_ref()),
            retired: VecDeque::new(),
            preferred_address: None,
        }
    }

    /// Create the coordinator of a connection which issues its connection IDs right away.
    ///
    /// With a `preferred_endpoint`, the first issued connection ID is bound to a
    /// new [`PreferredAddress`], see [`AltCids::preferred_address`].
    ///
    /// Fails if the connection IDs can not be generated, see [`CidExhausted`].
    pub fn with_local_endpoint(
        config: AltCidConfig,
        role: Role,
        reset_key: StatelessResetKey,
        router: ROUTER,
        initial_dcid: ConnectionId,
        preferred_endpoint: Option<SocketAddr>,
    ) -> Result<Self, CidExhausted> {
        let mut alt_cids = Self {
            config,
            local: LocalCids::new(&config, role, reset_key, router),
            remote: RemoteCids::new(initial_dcid, None),
            retired: VecDeque::new(),
            preferred_address: None,
        };
        alt_cids.populate(preferred_endpoint)?;
        Ok(alt_cids)
    }

    /// The frame types this coordinator has to receive.
    pub fn interests() -> &'static [FrameType] {
        &[FrameType::NewConnectionId, FrameType::RetireConnectionId]
    }

    /// The preferred address bound to one of our connection IDs, to be sent in
    /// the transport parameters.
    ///
    /// Absent once the bound connection ID has been replaced by [`AltCids::populate`].
    pub fn preferred_address(&self) -> Option<&PreferredAddress> {
        self.preferred_address.as_ref()
    }

    pub fn role(&self) -> Role {
        self.local.role()
    }

    /// The connection IDs issued by us, in pool order.
    pub fn local_cids(&self) -> impl Iterator<Item = &LocalCid> {
        self.local.iter()
    }

    /// The connection IDs issued by the peer, in arrival order.
    pub fn remote_cids(&self) -> impl Iterator<Item = &RemoteCid> {
        self.remote.iter()
    }

    pub fn is_populated(&self) -> bool {
        self.local.is_populated()
    }

    /// Whether some of our connection IDs may still wait to be advertised.
    pub fn need_advertise(&self) -> bool {
        self.local.need_advertise()
    }

    /// Number of the peer's connection IDs waiting to be retired.
    pub fn retired_len(&self) -> usize {
        self.retired.len()
    }

    /// Replace every issued connection ID with a fresh one.
    ///
    /// With a `preferred_endpoint`, the first of them is bound to a new preferred
    /// address instead of being advertised by a NEW_CONNECTION_ID frame. Otherwise
    /// the previous preferred address, whose connection ID is gone, is dropped.
    ///
    /// On failure nothing is replaced.
    pub fn populate(&mut self, preferred_endpoint: Option<SocketAddr>) -> Result<(), CidExhausted> {
        self.preferred_address = self.local.populate(preferred_endpoint)?;
        Ok(())
    }

    /// Receive a connection ID frame routed to this coordinator.
    pub fn recv_frame(&mut self, frame: &ConnectionIdFrame) -> Result<(), Error> {
        match frame {
            ConnectionIdFrame::NewConnectionId(frame) => self.recv_new_cid_frame(frame),
            ConnectionIdFrame::RetireConnectionId(frame) => self.recv_retire_cid_frame(frame),
        }
    }

    /// Register a connection ID issued by the peer.
    ///
    /// A zero-length connection ID is a PROTOCOL_VIOLATION. Sequence numbers are
    /// not deduplicated, the entry is appended as written.
    pub fn recv_new_cid_frame(&mut self, frame: &NewConnectionIdFrame) -> Result<(), Error> {
        self.remote.recv_new_cid_frame(frame)
    }

    /// The peer retired one of our connection IDs, issue a new one in its place.
    ///
    /// Failing to generate the replacement is an INTERNAL_ERROR.
    pub fn recv_retire_cid_frame(&mut self, frame: &RetireConnectionIdFrame) -> Result<(), Error> {
        let seq = frame.sequence.into_inner();
        match self.local.update(seq) {
            Ok(true) => Ok(()),
            Ok(false) => Err(Error::new(
                ErrorKind::ProtocolViolation,
                frame.frame_type(),
                format!("sequence number {seq} not currently advertised"),
            )),
            Err(exhausted) => Err(Error::new(
                ErrorKind::Internal,
                frame.frame_type(),
                exhausted.to_string(),
            )),
        }
    }

    /// Whether there is a connection ID of the peer that has not been used.
    pub fn is_ready_to_migrate(&self) -> bool {
        self.remote.has_unused()
    }

    /// Choose the destination connection ID for a migration, and mark it used.
    ///
    /// The client rotates all the connection IDs it issued before switching paths,
    /// so the new path can not be linked to the old one by them.
    ///
    /// Fails without selecting anything if the client can not generate its new
    /// connection IDs, see [`CidExhausted`].
    ///
    /// # Panics
    ///
    /// Panics if [`AltCids::is_ready_to_migrate`] is `false`.
    pub fn select_migration_cid(&mut self) -> Result<RemoteCid, CidExhausted> {
        if self.local.role().is_initiator() {
            self.populate(None)?;
        }
        let Some(cid) = self.remote.select_unused() else {
            unreachable!("no unused remote connection id, check is_ready_to_migrate first");
        };
        tracing::debug!(dcid = %cid.id(), seq = cid.sequence(), "selected connection id for migration");
        Ok(cid)
    }

    /// Validate the connection ID observed on a new path, return the reset token
    /// of it if it was issued by us.
    pub fn resolve_local(&self, cid: &ConnectionId) -> Option<ResetToken> {
        self.local.resolve(cid)
    }

    /// Stop using a connection ID of the peer, it will be retired by a
    /// RETIRE_CONNECTION_ID frame. No-op if the connection ID is unknown.
    pub fn drop_cid(&mut self, cid: &ConnectionId) {
        if let Some(dropped) = self.remote.remove(cid) {
            tracing::debug!(dcid = %cid, seq = dropped.sequence(), "dropping connection id issued by peer");
            self.retired.push_back(dropped.sequence());
        }
    }

    /// Unregister all of our connection IDs from the routing table.
    ///
    /// Must be called before the connection is released, otherwise the routing
    /// table keeps delivering packets to it.
    pub fn invalidate_all_local(&self) {
        self.local.invalidate_all();
    }

    fn is_eligible(&self, space: SpaceId) -> bool {
        self.config.eligible_spaces().contains_space(space)
            && FrameType::NewConnectionId.belongs_to(space)
    }

    /// Whether [`AltCids::next_frame`] may produce a frame in `space`.
    pub fn has_pending_work(&self, space: SpaceId) -> bool {
        self.is_eligible(space)
            && ((self.local.need_advertise() && self.local.has_unadvertised())
                || !self.retired.is_empty())
    }

    /// Produce at most one frame which fits in `size_budget` bytes.
    ///
    /// NEW_CONNECTION_ID frames for our unadvertised connection IDs go first, in
    /// pool order. If the next one does not fit, nothing is produced this time and
    /// it stays unadvertised. RETIRE_CONNECTION_ID frames follow in FIFO order.
    pub fn next_frame(&mut self, space: SpaceId, size_budget: usize) -> Option<ConnectionIdFrame> {
        if !self.is_eligible(space) {
            return None;
        }

        if self.local.need_advertise() {
            let mut fits = true;
            let frame = self.local.advertise_next(|cid| {
                let sequence = VarInt::from_u64(cid.sequence())
                    .expect("Sequence of connection id is very hard to exceed VARINT_MAX");
                let frame = NewConnectionIdFrame::new(sequence, cid.id(), cid.reset_token());
                fits = frame.encoding_size() <= size_budget;
                fits.then_some(frame)
            });
            if let Some(frame) = frame {
                tracing::trace!(seq = %frame.sequence, %space, "advertise connection id");
                return Some(frame.into());
            }
            if !fits {
                tracing::trace!(size_budget, %space, "no room for NEW_CONNECTION_ID frame");
                return None;
            }
        }

        let seq = self.retired.pop_front()?;
        let sequence = VarInt::from_u64(seq)
            .expect("Sequence of connection id received from peer always fits in VarInt");
        tracing::trace!(seq, %space, "retire connection id");
        Some(RetireConnectionIdFrame { sequence }.into())
    }
}

/// Shared alternate connection IDs, so that the frame dispatching and the packet
/// assembling of a connection can both reach it.
#[derive(Debug)]
pub struct ArcAltCids<ROUTER>(Arc<Mutex<AltCids<ROUTER>>>);

impl<ROUTER> Clone for ArcAltCids<ROUTER> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl<ROUTER: RouteCid> ArcAltCids<ROUTER> {
    pub fn new(alt_cids: AltCids<ROUTER>) -> Self {
        Self(Arc::new(Mutex::new(alt_cids)))
    }

    pub fn lock_guard(&self) -> MutexGuard<'_, AltCids<ROUTER>> {
        self.0.lock().unwrap()
    }
}

impl<ROUTER: RouteCid> ReceiveFrame<NewConnectionIdFrame> for ArcAltCids<ROUTER> {
    type Output = ();

    fn recv_frame(&self, frame: &NewConnectionIdFrame) -> Result<Self::Output, Error> {
        self.lock_guard().recv_new_cid_frame(frame)
    }
}

impl<ROUTER: RouteCid> ReceiveFrame<RetireConnectionIdFrame> for ArcAltCids<ROUTER> {
    type Output = ();

    fn recv_frame(&self, frame: &RetireConnectionIdFrame) -> Result<Self::Output, Error> {
        self.lock_guard().recv_retire_cid_frame(frame)
    }
}
