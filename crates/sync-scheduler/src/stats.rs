/// Point-in-time progress snapshot of the buddy pool, for status reporting.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct SchedulerStats {
    pub peers_single: usize,
    pub peers_multi: usize,
    pub peers_pool: usize,
    pub covered_accounts_factor: f64,
    pub active_pivot_number: u64,
}
