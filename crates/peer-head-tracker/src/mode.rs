use range_desc::NodeKey;

/// A tagged variant per sync mode rather than one flat struct with optional
/// fields — `HuntRange` has no use for `best_hash`, `Locked` has no use for
/// `step`, and so on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SyncMode {
    /// `best_number`/`best_hash` are authoritative only here.
    Locked { best_number: u64, best_hash: NodeKey },
    OnlyHash { hash: NodeKey },
    HuntForward { low: u64, high: u64, step: u64 },
    HuntBackward { low: u64, high: u64, step: u64 },
    HuntRange { low: u64, high: u64 },
    HuntRangeFinal { low: u64, high: u64 },
}

impl SyncMode {
    pub fn locked_number(&self) -> Option<u64> {
        match self {
            SyncMode::Locked { best_number, .. } => Some(*best_number),
            _ => None,
        }
    }
}
