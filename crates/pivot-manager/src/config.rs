/// Tunables for pivot replacement. Defaults match the spec's non-negotiable
/// constants.
#[derive(Clone, Copy, Debug)]
pub struct PivotManagerConfig {
    pub lru_capacity: usize,
    pub min_distance: u64,
    /// "new peers don't replace a completed pivot."
    pub stop_changing_if_complete: bool,
}

impl Default for PivotManagerConfig {
    fn default() -> Self {
        Self { lru_capacity: 50, min_distance: 128, stop_changing_if_complete: true }
    }
}
