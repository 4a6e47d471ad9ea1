/// Flags shared across the buddy pool. Mutated only between suspension
/// points under the cooperative scheduling model, so plain fields are
/// race-free without a lock even though buddies are logically concurrent.
#[derive(Debug, Default, Clone, Copy)]
pub struct SchedulerCtrl {
    /// Set once a single-mode buddy negotiates a pivot; promotes every
    /// single-mode buddy to multi-mode on the next tick.
    pub multi_ok: bool,
    /// Set to request a pool-mode barrier round; cleared once the hook runs.
    pub pool_mode: bool,
    /// Checked at every suspension point; a stopped buddy exits without
    /// further mutation.
    pub stopped: bool,
}
