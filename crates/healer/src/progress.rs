use primitive_types::U256;

// Mirrors `interval_set::set::TWO_POW_256`; duplicated here because the
// conversion is a tiny, self-contained utility and this crate's notion of
// "fraction of the key space" is deliberately not deduplicated the way an
// `IntervalSet`'s `full_factor` is (see [`HealTrigger`]).
const TWO_POW_256: f64 = 1.157_920_892_373_161_9e77;

fn u256_to_f64(x: U256) -> f64 {
    let mut result = 0f64;
    for limb in x.0.iter().rev() {
        result = result * (u64::MAX as f64 + 1.0) + (*limb as f64);
    }
    result
}

/// Tracks how many account-hash-space points have been fetched across the
/// whole sync, counting a point again every time a pivot replacement
/// refetches it. Unlike `IntervalSet::full_factor` (which dedups and caps
/// at `1.0`), this factor can exceed `1.0` once enough redundant work has
/// been spent — that is what lets `healAccountsTrigger = 1.3` mean
/// something: heal only once the equivalent of a full sweep of the space,
/// including reorg churn, has actually been attempted.
#[derive(Debug, Default, Clone, Copy)]
pub struct HealTrigger {
    cumulative_covered: U256,
}

impl HealTrigger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that a fetch round covered `delta` more points, regardless
    /// of whether they overlap points already covered by another pivot.
    pub fn record(&mut self, delta: U256) {
        self.cumulative_covered = self.cumulative_covered.overflowing_add(delta).0;
    }

    pub fn accounts_factor(&self) -> f64 {
        u256_to_f64(self.cumulative_covered) / TWO_POW_256
    }

    pub fn cumulative_covered(&self) -> U256 {
        self.cumulative_covered
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn factor_can_exceed_one_after_redundant_coverage() {
        let mut trigger = HealTrigger::new();
        trigger.record(U256::MAX);
        trigger.record(U256::MAX / U256::from(2u64));
        assert!(trigger.accounts_factor() > 1.0);
    }

    #[test]
    fn fresh_trigger_is_zero() {
        let trigger = HealTrigger::new();
        assert_eq!(trigger.accounts_factor(), 0.0);
    }
}
