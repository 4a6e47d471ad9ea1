use crate::mode::BuddyMode;
use snap_net::PeerId;

/// A per-peer worker slot within the pool. The scheduler owns the mode
/// transitions; the peer's actual work (fetching, healing, negotiating a
/// pivot) is driven through [`crate::work::BuddyWork`].
#[derive(Debug, Clone, Copy)]
pub struct Buddy {
    pub peer: PeerId,
    pub mode: BuddyMode,
}

impl Buddy {
    pub fn new(peer: PeerId) -> Self {
        Self { peer, mode: BuddyMode::Single }
    }
}
