use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

use dashmap::{DashMap, Entry};
use derive_more::{Display, Into};
use qbase::cid::{ConnectionId, RouteCid};

/// Opaque, hashable handle of one connection of the endpoint.
#[derive(Debug, Display, Clone, Copy, Into, PartialEq, Eq, Hash)]
#[display("conn#{_0}")]
pub struct ConnHandle(usize);

static NEXT_CONN_HANDLE: AtomicUsize = AtomicUsize::new(1);

impl ConnHandle {
    /// Allocate a handle which is unique within the process.
    ///
    /// ```
    /// use qinterface::ConnHandle;
    ///
    /// assert_ne!(ConnHandle::generate(), ConnHandle::generate());
    /// ```
    pub fn generate() -> Self {
        let id = NEXT_CONN_HANDLE.fetch_add(1, Ordering::Relaxed);
        assert_ne!(id, 0, "ConnHandle overflow");
        Self(id)
    }
}

/// The routing table of an endpoint, maps connection IDs to the connections
/// that issued them.
///
/// Shared by all the connections of the endpoint, every operation is atomic on
/// its own.
#[derive(Debug, Default)]
pub struct CidRouter {
    routes: DashMap<ConnectionId, ConnHandle>,
}

impl CidRouter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Route `cid` to `owner`, unless it is already routed to any connection.
    pub fn insert(&self, cid: ConnectionId, owner: ConnHandle) -> bool {
        match self.routes.entry(cid) {
            Entry::Occupied(..) => false,
            Entry::Vacant(entry) => {
                entry.insert(owner);
                true
            }
        }
    }

    /// Remove the route of `cid`, only if it leads to `owner`.
    pub fn erase(&self, cid: &ConnectionId, owner: ConnHandle) -> bool {
        self.routes.remove_if(cid, |_, routed| *routed == owner).is_some()
    }

    /// Find the connection which packets carrying `cid` are delivered to.
    pub fn get(&self, cid: &ConnectionId) -> Option<ConnHandle> {
        self.routes.get(cid).map(|entry| *entry.value())
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// The view of this table for the connection `owner`, to be handed to its
    /// connection ID coordinator.
    pub fn registry(self: &Arc<Self>, owner: ConnHandle) -> RouterRegistry {
        RouterRegistry {
            router: self.clone(),
            owner,
        }
    }
}

/// The routing table seen from one connection.
#[derive(Debug, Clone)]
pub struct RouterRegistry {
    router: Arc<CidRouter>,
    owner: ConnHandle,
}

impl RouterRegistry {
    pub fn owner(&self) -> ConnHandle {
        self.owner
    }
}

impl RouteCid for RouterRegistry {
    fn register(&self, cid: &ConnectionId) -> bool {
        let registered = self.router.insert(*cid, self.owner);
        if !registered {
            tracing::trace!(%cid, owner = %self.owner, "connection id already routed");
        }
        registered
    }

    fn unregister(&self, cid: &ConnectionId) {
        if self.router.erase(cid, self.owner) {
            tracing::trace!(%cid, owner = %self.owner, "connection id unrouted");
        }
    }
}
