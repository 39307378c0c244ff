use crate::NodeId;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// The identity no longer maps to a live node (torn down, or never existed).
    #[error("node {0} does not resolve to a live view")]
    Resolution(NodeId),

    /// Zero-area or oversized raster allocation.
    #[error("cannot allocate a {width}x{height} raster")]
    Raster { width: u32, height: u32 },

    /// An asynchronous resolution finished after the slot was rebound.
    #[error("binding to {0} was superseded before it resolved")]
    Stale(NodeId),

    /// Structural edit or invalidation against an identity nobody tracks.
    #[error("node {0} is not tracked")]
    Untracked(NodeId),

    #[error("UI context accessed from a foreign thread")]
    WrongThread,
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
