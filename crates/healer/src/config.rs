/// Trigger thresholds and batch caps for the healing phase.
///
/// `accounts_trigger` is compared against a cumulative fetched-point count
/// that is *not* deduplicated across pivots (the same range can be
/// refetched as pivots advance), so unlike an ordinary coverage factor it
/// can exceed `1.0` — the canonical value `1.3` means "start healing only
/// after the equivalent of one full sweep of the key space has been spent
/// fetching, dedup or not."
#[derive(Clone, Copy, Debug)]
pub struct HealerConfig {
    pub accounts_trigger: f64,
    pub storage_trigger: f64,
    pub accounts_batch_max: usize,
    pub storage_batch_max: usize,
    pub request_bytes_limit: u64,
}

impl Default for HealerConfig {
    fn default() -> Self {
        Self {
            accounts_trigger: 1.3,
            storage_trigger: 0.70,
            accounts_batch_max: 10 * 1024,
            storage_batch_max: 32,
            request_bytes_limit: 2 * 1024 * 1024,
        }
    }
}
