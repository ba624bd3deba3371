mod connection_id;
pub use connection_id::*;

mod local_cid;
pub use local_cid::LocalCid;

mod remote_cid;
pub use remote_cid::RemoteCid;

mod alt_cid;
pub use alt_cid::{AltCids, ArcAltCids};

/// Attempts to draw a unique connection ID before giving up.
pub const GENERATE_ATTEMPTS: usize = 4096;

/// No unique connection ID of the configured length could be generated, all the
/// drawn ones collided with ids in use locally or routed in the endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("no unique connection id of {cid_len} bytes after {} attempts", GENERATE_ATTEMPTS)]
pub struct CidExhausted {
    pub cid_len: usize,
}

/// The packet routing table shared by all connections of an endpoint,
/// seen from one connection.
///
/// Inbound packets carrying any registered connection ID are delivered to the
/// connection this view belongs to. The implementation is responsible for its
/// own concurrency discipline, each call is an independent atomic operation.
pub trait RouteCid {
    /// Associate `cid` with the owning connection.
    ///
    /// Returns `false` and leaves the table untouched if `cid` is already routed,
    /// in which case the caller must pick another connection ID.
    fn register(&self, cid: &ConnectionId) -> bool;

    /// Remove the association between `cid` and the owning connection, if any.
    fn unregister(&self, cid: &ConnectionId);
}

/// No routing at all, for endpoints that never accept inbound connections.
impl RouteCid for () {
    fn register(&self, _cid: &ConnectionId) -> bool {
        true
    }

    fn unregister(&self, _cid: &ConnectionId) {}
}

impl<R: RouteCid + ?Sized> RouteCid for std::sync::Arc<R> {
    fn register(&self, cid: &ConnectionId) -> bool {
        (**self).register(cid)
    }

    fn unregister(&self, cid: &ConnectionId) {
        (**self).unregister(cid)
    }
}
