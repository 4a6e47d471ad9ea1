use primitive_types::U256;

/// Tunables for claim sizing, request limits, and the zombie-degradation
/// thresholds.
#[derive(Clone, Debug)]
pub struct FetcherConfig {
    pub max_fetch_range: U256,
    pub request_bytes_limit: u64,
    pub storage_slots_fetch_max: usize,
    pub storage_slots_qu_prio_thresh: usize,
    pub code_batch_max: usize,
    pub com_errors_timeout_max: u32,
    pub com_errors_network_max: u32,
    pub com_errors_nodata_max: u32,
    pub sleep_timeout_ms: u64,
    pub sleep_network_ms: u64,
    pub sleep_nodata_ms: u64,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        // 2**256 / 1000, computed as a U256 division.
        let max_fetch_range = U256::MAX / U256::from(1000u64);
        Self {
            max_fetch_range,
            request_bytes_limit: 2 * 1024 * 1024,
            storage_slots_fetch_max: 2048,
            storage_slots_qu_prio_thresh: 5000,
            code_batch_max: 384,
            com_errors_timeout_max: 3,
            com_errors_network_max: 5,
            com_errors_nodata_max: 3,
            sleep_timeout_ms: 5000,
            sleep_network_ms: 5000,
            sleep_nodata_ms: 0,
        }
    }
}
