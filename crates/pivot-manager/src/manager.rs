use crate::config::PivotManagerConfig;
use crate::pivot_env::{HealState, PivotEnv, StateHeader};
use interval_set::IntervalSet;
use lru::LruCache;
use range_desc::NodeKey;
use std::num::NonZeroUsize;

/// Owns the LRU of in-flight pivots, the currently-active one, and the
/// process-wide covered-accounts union used as a healing trigger across
/// pivot replacements.
#[derive(Debug)]
pub struct PivotManager {
    table: LruCache<NodeKey, PivotEnv>,
    active_root: NodeKey,
    covered_accounts: IntervalSet,
    config: PivotManagerConfig,
}

impl PivotManager {
    pub fn new(genesis: StateHeader, config: PivotManagerConfig) -> Self {
        let cap = NonZeroUsize::new(config.lru_capacity.max(1)).unwrap();
        let mut table = LruCache::new(cap);
        table.put(genesis.state_root, PivotEnv::new(genesis));
        Self { table, active_root: genesis.state_root, covered_accounts: IntervalSet::new(), config }
    }

    pub fn active(&self) -> &PivotEnv {
        self.table.peek(&self.active_root).expect("active pivot always present in table")
    }

    pub fn active_mut(&mut self) -> &mut PivotEnv {
        self.table.get_mut(&self.active_root).expect("active pivot always present in table")
    }

    pub fn covered_accounts(&self) -> &IntervalSet {
        &self.covered_accounts
    }

    /// Whether a newly negotiated pivot should replace the active one:
    /// a completed pivot is sticky unless `stop_changing_if_complete` is
    /// off, the candidate must clear `min_distance` blocks ahead, and no
    /// reorg may be in flight within the replacement window.
    pub fn should_replace(&self, candidate: &StateHeader, reorg_within_window: bool) -> bool {
        if reorg_within_window {
            return false;
        }
        let active = self.active();
        if self.config.stop_changing_if_complete && active.is_accounts_complete() {
            return false;
        }
        candidate.number > active.header.number + self.config.min_distance
    }

    /// Replace the active pivot, folding the outgoing one's covered range
    /// into the process-wide union, and evicting the LRU's oldest entry
    /// (folding its covered range too) if the table is at capacity.
    pub fn replace(&mut self, header: StateHeader) {
        let outgoing_covered = self.active().covered.clone();
        self.covered_accounts = union(&self.covered_accounts, &outgoing_covered);

        if self.table.len() >= self.table.cap().get() && !self.table.contains(&header.state_root) {
            if let Some((_, evicted)) = self.table.pop_lru() {
                self.covered_accounts = union(&self.covered_accounts, &evicted.covered);
            }
        }

        tracing::info!(
            old_number = self.active().header.number,
            new_number = header.number,
            "pivot replaced"
        );
        self.table.put(header.state_root, PivotEnv::new(header));
        self.active_root = header.state_root;
    }

    pub fn mark_healing(&mut self, state: HealState) {
        self.active_mut().healing = state;
    }
}

fn union(a: &IntervalSet, b: &IntervalSet) -> IntervalSet {
    let mut out = a.clone();
    for iv in b.increasing_iter() {
        out.merge_interval(iv);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use interval_set::Interval;
    use range_desc::NodeTag;

    fn header(n: u64) -> StateHeader {
        StateHeader { number: n, hash: NodeKey::new([n as u8; 32]), state_root: NodeKey::new([(n + 1) as u8; 32]) }
    }

    #[test]
    fn fresh_pivot_is_not_replaced_below_min_distance() {
        let manager = PivotManager::new(header(0), PivotManagerConfig::default());
        assert!(!manager.should_replace(&header(100), false));
        assert!(manager.should_replace(&header(200), false));
    }

    #[test]
    fn reorg_within_window_blocks_replacement() {
        let manager = PivotManager::new(header(0), PivotManagerConfig::default());
        assert!(!manager.should_replace(&header(500), true));
    }

    #[test]
    fn completed_pivot_is_sticky_by_default() {
        let mut manager = PivotManager::new(header(0), PivotManagerConfig::default());
        manager.active_mut().mark_covered(Interval::new(NodeTag::MIN, NodeTag::max_value()));
        assert!(manager.active().is_accounts_complete());
        assert!(!manager.should_replace(&header(1000), false));
    }

    #[test]
    fn replace_creates_fresh_full_range_env_and_folds_covered() {
        let mut manager = PivotManager::new(header(0), PivotManagerConfig::default());
        manager.active_mut().mark_covered(Interval::new(NodeTag::MIN, NodeTag::from(999u64)));

        manager.replace(header(200));
        assert_eq!(manager.active().header.number, 200);
        assert!(!manager.active().fetch_accounts.primary.is_empty());
        assert!(!manager.covered_accounts().is_empty());
    }

    #[test]
    fn lru_eviction_folds_evicted_coverage() {
        let mut config = PivotManagerConfig::default();
        config.lru_capacity = 2;
        config.min_distance = 0;
        let mut manager = PivotManager::new(header(0), config);
        manager.active_mut().mark_covered(Interval::new(NodeTag::MIN, NodeTag::from(100u64)));

        manager.replace(header(1));
        manager.replace(header(2));

        assert!(!manager.covered_accounts().is_empty());
    }
}
