use crate::config::FetcherConfig;

/// Consecutive communication-error counters per peer. A success resets all
/// three; crossing any threshold marks the peer a zombie for the scheduler
/// to disconnect.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PeerHealth {
    pub timeout_errors: u32,
    pub network_errors: u32,
    pub nodata_errors: u32,
}

impl PeerHealth {
    pub fn record_timeout(&mut self) {
        self.timeout_errors += 1;
    }

    pub fn record_network(&mut self) {
        self.network_errors += 1;
    }

    pub fn record_nodata(&mut self) {
        self.nodata_errors += 1;
    }

    pub fn record_success(&mut self) {
        *self = PeerHealth::default();
    }

    pub fn is_zombie(&self, config: &FetcherConfig) -> bool {
        self.timeout_errors >= config.com_errors_timeout_max
            || self.network_errors >= config.com_errors_network_max
            || self.nodata_errors >= config.com_errors_nodata_max
    }
}
