use std::net::SocketAddr;

use getset::CopyGetters;

use super::{CidExhausted, ConnectionId, GENERATE_ATTEMPTS, RouteCid};
use crate::{
    config::AltCidConfig,
    param::PreferredAddress,
    role::Role,
    token::{ResetToken, StatelessResetKey},
};

/// An alternate connection ID issued by us.
#[derive(Debug, Clone, Copy, PartialEq, Eq, CopyGetters)]
#[getset(get_copy = "pub")]
pub struct LocalCid {
    sequence: u64,
    id: ConnectionId,
    reset_token: ResetToken,
    /// Whether the NEW_CONNECTION_ID frame carrying it has been produced,
    /// or it has been bound to the preferred address.
    advertised: bool,
}

/// The fixed size pool of alternate connection IDs issued to the peer.
///
/// Sequence number 0 belongs to the connection ID used during the handshake,
/// which is never part of the pool, so the alternate ones start from 1.
#[derive(Debug)]
pub(super) struct LocalCids<ROUTER> {
    // Empty until populated, then always exactly `capacity` slots.
    pool: Vec<LocalCid>,
    capacity: usize,
    cid_len: usize,
    instance_id: u32,
    reset_key: StatelessResetKey,
    role: Role,
    router: ROUTER,
    largest_seq: u64,
    need_advertise: bool,
}

impl<ROUTER: RouteCid> LocalCids<ROUTER> {
    pub(super) fn new(
        config: &AltCidConfig,
        role: Role,
        reset_key: StatelessResetKey,
        router: ROUTER,
    ) -> Self {
        Self {
            pool: Vec::with_capacity(config.num_alt_cids()),
            capacity: config.num_alt_cids(),
            cid_len: config.cid_len(),
            instance_id: config.instance_id(),
            reset_key,
            role,
            router,
            largest_seq: 0,
            need_advertise: false,
        }
    }

    pub(super) fn role(&self) -> Role {
        self.role
    }

    pub(super) fn need_advertise(&self) -> bool {
        self.need_advertise
    }

    pub(super) fn is_populated(&self) -> bool {
        !self.pool.is_empty()
    }

    pub(super) fn iter(&self) -> impl Iterator<Item = &LocalCid> {
        self.pool.iter()
    }

    /// Generate a unique connection ID, its reset token and the next sequence number.
    ///
    /// The id must not collide with the current pool nor with `fresh`, the entries
    /// generated for a pool which has not been installed yet. The server also
    /// claims it in the routing table, which rejects ids routed to any connection.
    /// Gives up after [`GENERATE_ATTEMPTS`] draws, the sequence number is only
    /// consumed on success.
    fn generate(&mut self, fresh: &[LocalCid]) -> Result<LocalCid, CidExhausted> {
        let in_use = |id: &ConnectionId| self.pool.iter().chain(fresh).any(|c| c.id == *id);
        let id = (0..GENERATE_ATTEMPTS)
            .map(|_| ConnectionId::random_gen(self.cid_len))
            .find(|id| !in_use(id) && (self.role.is_initiator() || self.router.register(id)))
            .ok_or_else(|| {
                tracing::warn!(cid_len = self.cid_len, "connection id space exhausted");
                CidExhausted {
                    cid_len: self.cid_len,
                }
            })?;

        self.largest_seq += 1;
        let entry = LocalCid {
            sequence: self.largest_seq,
            id,
            reset_token: self.reset_key.derive(&id, self.instance_id),
            advertised: false,
        };
        tracing::debug!(alt_cid = %id, seq = entry.sequence, "generated alternate connection id");
        Ok(entry)
    }

    /// Fill every slot with a freshly generated connection ID.
    ///
    /// With a `preferred_endpoint`, the first one is bound to a new [`PreferredAddress`]
    /// and considered advertised, it is only delivered through the transport parameter.
    ///
    /// On failure the current pool is kept as is, the ids already claimed for the
    /// new pool are released and their sequence numbers are reused next time.
    pub(super) fn populate(
        &mut self,
        preferred_endpoint: Option<SocketAddr>,
    ) -> Result<Option<PreferredAddress>, CidExhausted> {
        let largest_seq = self.largest_seq;
        let mut fresh = Vec::with_capacity(self.capacity);
        for _ in 0..self.capacity {
            match self.generate(&fresh) {
                Ok(entry) => fresh.push(entry),
                Err(exhausted) => {
                    self.release(&fresh);
                    self.largest_seq = largest_seq;
                    return Err(exhausted);
                }
            }
        }

        let preferred_address = preferred_endpoint.map(|endpoint| {
            fresh[0].advertised = true;
            PreferredAddress::from_endpoint(endpoint, fresh[0].id, fresh[0].reset_token)
        });

        let replaced = std::mem::replace(&mut self.pool, fresh);
        self.release(&replaced);
        self.need_advertise = true;
        Ok(preferred_address)
    }

    /// Regenerate the slot holding `seq` in place, after the peer retired it.
    ///
    /// Sequence number 0 is the implicit initial connection ID, retiring it is
    /// accepted without touching the pool. Returns `false` for any other sequence
    /// number which is not currently in the pool.
    pub(super) fn update(&mut self, seq: u64) -> Result<bool, CidExhausted> {
        let Some(idx) = self.pool.iter().position(|entry| entry.sequence == seq) else {
            return Ok(seq == 0);
        };

        let entry = self.generate(&[])?;
        let retired = std::mem::replace(&mut self.pool[idx], entry);
        self.release(std::slice::from_ref(&retired));
        tracing::debug!(alt_cid = %retired.id, seq, "peer retired alternate connection id");
        self.need_advertise = true;
        Ok(true)
    }

    fn release(&self, entries: &[LocalCid]) {
        if self.role.is_acceptor() {
            for entry in entries {
                self.router.unregister(&entry.id);
            }
        }
    }

    /// Find the reset token of a connection ID issued by us.
    pub(super) fn resolve(&self, cid: &ConnectionId) -> Option<ResetToken> {
        self.pool
            .iter()
            .find(|entry| entry.id == *cid)
            .map(|entry| entry.reset_token)
    }

    /// Take the first entry in pool order that has not been advertised yet.
    ///
    /// The entry is marked advertised only if `advertise` returns `Some`.
    /// Clears the pending flag and returns `None` if every entry is advertised.
    pub(super) fn advertise_next<T>(&mut self, advertise: impl FnOnce(&LocalCid) -> Option<T>) -> Option<T> {
        let Some(entry) = self.pool.iter_mut().find(|entry| !entry.advertised) else {
            self.need_advertise = false;
            return None;
        };
        let output = advertise(entry)?;
        entry.advertised = true;
        Some(output)
    }

    pub(super) fn has_unadvertised(&self) -> bool {
        self.pool.iter().any(|entry| !entry.advertised)
    }

    /// Unregister every issued connection ID from the routing table.
    pub(super) fn invalidate_all(&self) {
        for entry in &self.pool {
            self.router.unregister(&entry.id);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::{
        collections::HashSet,
        sync::{Arc, Mutex},
    };

    use super::*;

    #[derive(Debug, Default)]
    struct Routes(Mutex<HashSet<ConnectionId>>);

    impl RouteCid for Routes {
        fn register(&self, cid: &ConnectionId) -> bool {
            self.0.lock().unwrap().insert(*cid)
        }

        fn unregister(&self, cid: &ConnectionId) {
            self.0.lock().unwrap().remove(cid);
        }
    }

    fn local_cids(role: Role, routes: &Arc<Routes>) -> LocalCids<Arc<Routes>> {
        let config = AltCidConfig::builder().num_alt_cids(3usize).build().unwrap();
        LocalCids::new(&config, role, StatelessResetKey::random_gen(), routes.clone())
    }

    #[test]
    fn test_populate() {
        let routes = Arc::new(Routes::default());
        let mut local = local_cids(Role::Server, &routes);
        assert!(!local.is_populated());
        assert!(local.populate(None).unwrap().is_none());

        assert!(local.need_advertise());
        assert_eq!(local.iter().count(), 3);
        let seqs = local.iter().map(|c| c.sequence()).collect::<Vec<_>>();
        assert_eq!(seqs, [1, 2, 3]);
        let ids = local.iter().map(|c| c.id()).collect::<HashSet<_>>();
        assert_eq!(ids.len(), 3);
        assert_eq!(*routes.0.lock().unwrap(), ids);
        assert!(local.iter().all(|c| !c.advertised() && c.id().len() == 8));
    }

    #[test]
    fn test_populate_with_preferred_endpoint() {
        let routes = Arc::new(Routes::default());
        let mut local = local_cids(Role::Server, &routes);
        let endpoint = "192.0.2.7:443".parse().unwrap();
        let preferred_address = local.populate(Some(endpoint)).unwrap().unwrap();

        let first = *local.iter().next().unwrap();
        assert!(first.advertised());
        assert_eq!(preferred_address.connection_id(), first.id());
        assert_eq!(preferred_address.stateless_reset_token(), first.reset_token());
        assert!(local.iter().skip(1).all(|c| !c.advertised()));
    }

    #[test]
    fn test_repopulate_replaces_routes() {
        let routes = Arc::new(Routes::default());
        let mut local = local_cids(Role::Server, &routes);
        local.populate(None).unwrap();
        let old = local.iter().map(|c| c.id()).collect::<HashSet<_>>();

        local.populate(None).unwrap();
        let new = local.iter().map(|c| c.id()).collect::<HashSet<_>>();
        assert!(old.is_disjoint(&new));
        assert_eq!(*routes.0.lock().unwrap(), new);
        assert_eq!(local.iter().map(|c| c.sequence()).collect::<Vec<_>>(), [4, 5, 6]);
    }

    #[test]
    fn test_client_never_registers() {
        let routes = Arc::new(Routes::default());
        let mut local = local_cids(Role::Client, &routes);
        local.populate(None).unwrap();
        assert!(local.update(2).unwrap());
        assert!(routes.0.lock().unwrap().is_empty());
    }

    #[test]
    fn test_update() {
        let routes = Arc::new(Routes::default());
        let mut local = local_cids(Role::Server, &routes);
        local.populate(None).unwrap();
        let retired = local.iter().nth(1).copied().unwrap();

        assert!(local.update(retired.sequence()).unwrap());
        let replaced = local.iter().nth(1).copied().unwrap();
        assert_eq!(replaced.sequence(), 4);
        assert_ne!(replaced.id(), retired.id());
        assert!(!routes.0.lock().unwrap().contains(&retired.id()));
        assert!(routes.0.lock().unwrap().contains(&replaced.id()));

        let before = local.iter().copied().collect::<Vec<_>>();
        assert!(local.update(0).unwrap());
        assert_eq!(local.iter().copied().collect::<Vec<_>>(), before);
        assert!(!local.update(2).unwrap());
        assert!(!local.update(42).unwrap());
    }

    #[test]
    fn test_resolve_and_invalidate() {
        let routes = Arc::new(Routes::default());
        let mut local = local_cids(Role::Server, &routes);
        local.populate(None).unwrap();

        let entry = *local.iter().last().unwrap();
        assert_eq!(local.resolve(&entry.id()), Some(entry.reset_token()));
        assert_eq!(local.resolve(&ConnectionId::from_slice(&[0xaa])), None);

        local.invalidate_all();
        assert!(routes.0.lock().unwrap().is_empty());
    }

    #[test]
    fn test_advertise_next() {
        let routes = Arc::new(Routes::default());
        let mut local = local_cids(Role::Server, &routes);
        local.populate(None).unwrap();

        assert_eq!(local.advertise_next(|_| None::<()>), None);
        assert!(local.has_unadvertised());
        assert!(local.need_advertise());

        let seqs = std::iter::from_fn(|| local.advertise_next(|c| Some(c.sequence())))
            .collect::<Vec<_>>();
        assert_eq!(seqs, [1, 2, 3]);
        assert!(!local.has_unadvertised());
        assert!(!local.need_advertise());
    }

    fn one_byte_cids(num_alt_cids: usize, role: Role, routes: &Arc<Routes>) -> LocalCids<Arc<Routes>> {
        let config = AltCidConfig::builder()
            .num_alt_cids(num_alt_cids)
            .cid_len(1usize)
            .build()
            .unwrap();
        LocalCids::new(&config, role, StatelessResetKey::random_gen(), routes.clone())
    }

    fn route_all_one_byte_cids(routes: &Routes, except: Option<u8>) {
        let mut routed = routes.0.lock().unwrap();
        for byte in (0..=u8::MAX).filter(|b| Some(*b) != except) {
            routed.insert(ConnectionId::from_slice(&[byte]));
        }
    }

    #[test]
    fn test_repopulate_smallest_id_space() {
        for role in [Role::Client, Role::Server] {
            let routes = Arc::new(Routes::default());
            let mut local = one_byte_cids(128, role, &routes);

            local.populate(None).unwrap();
            let old = local.iter().map(|c| c.id()).collect::<HashSet<_>>();
            assert_eq!(old.len(), 128);

            local.populate(None).unwrap();
            let new = local.iter().map(|c| c.id()).collect::<HashSet<_>>();
            assert_eq!(new.len(), 128);
            assert!(old.is_disjoint(&new));
            if role.is_acceptor() {
                assert_eq!(*routes.0.lock().unwrap(), new);
            }
        }
    }

    #[test]
    fn test_populate_with_exhausted_router() {
        let routes = Arc::new(Routes::default());
        route_all_one_byte_cids(&routes, None);
        let mut local = one_byte_cids(2, Role::Server, &routes);

        assert_eq!(local.populate(None), Err(CidExhausted { cid_len: 1 }));
        assert!(!local.is_populated());
        assert!(!local.need_advertise());
        assert_eq!(routes.0.lock().unwrap().len(), 256);
    }

    #[test]
    fn test_populate_releases_claimed_cids_on_failure() {
        let routes = Arc::new(Routes::default());
        route_all_one_byte_cids(&routes, Some(0x42));
        let mut local = one_byte_cids(2, Role::Server, &routes);

        // the only free id is claimed for the first slot, the second one can not be filled
        assert!(local.populate(None).is_err());
        assert!(!local.is_populated());
        assert!(!routes.0.lock().unwrap().contains(&ConnectionId::from_slice(&[0x42])));

        // the sequence numbers of the abandoned pool are not consumed
        routes.0.lock().unwrap().clear();
        local.populate(None).unwrap();
        assert_eq!(local.iter().map(|c| c.sequence()).collect::<Vec<_>>(), [1, 2]);
    }

    #[test]
    fn test_update_with_exhausted_router() {
        let routes = Arc::new(Routes::default());
        let mut local = one_byte_cids(2, Role::Server, &routes);
        local.populate(None).unwrap();
        let before = local.iter().copied().collect::<Vec<_>>();

        route_all_one_byte_cids(&routes, None);
        assert_eq!(local.update(1), Err(CidExhausted { cid_len: 1 }));
        assert_eq!(local.iter().copied().collect::<Vec<_>>(), before);
        assert!(routes.0.lock().unwrap().contains(&before[0].id()));
    }
}
