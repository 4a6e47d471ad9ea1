//! Disjoint-interval set over the 256-bit key space.
//!
//! Intervals never overlap and are kept sorted by `lo`; adjacent intervals
//! are coalesced eagerly on `merge`, so the set is always in minimal form.

use crate::interval::Interval;
use range_desc::NodeTag;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Cardinality of an [`IntervalSet`], represented as a 256-bit integer that
/// wraps to zero when the set covers the entire key space. `chunks == 1 &&
/// total == 0` is the canonical "whole space" signal; `chunks == 0` is the
/// empty set.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TotalCount {
    pub total: primitive_types::U256,
    pub chunks: usize,
}

impl TotalCount {
    pub fn is_full_space(&self) -> bool {
        self.chunks == 1 && self.total.is_zero()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks == 0
    }
}

/// A set of disjoint closed intervals `[lo, hi]` over the 256-bit key
/// space, stored as `lo -> hi` so range queries can use `BTreeMap`'s
/// ordered-range API directly.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct IntervalSet {
    ranges: BTreeMap<NodeTag, NodeTag>,
}

impl IntervalSet {
    pub fn new() -> Self {
        Self { ranges: BTreeMap::new() }
    }

    /// A set containing exactly `[0, 2²⁵⁶ − 1]`.
    pub fn full() -> Self {
        let mut set = Self::new();
        set.ranges.insert(NodeTag::MIN, NodeTag::max_value());
        set
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    pub fn chunk_count(&self) -> usize {
        self.ranges.len()
    }

    /// Add `[lo, hi]` to the set, coalescing with any overlapping or
    /// adjacent interval. Returns the number of points newly covered.
    pub fn merge(&mut self, lo: NodeTag, hi: NodeTag) -> primitive_types::U256 {
        let incoming = Interval::new(lo, hi);
        let mut merged_lo = lo;
        let mut merged_hi = hi;
        let mut covered_within = primitive_types::U256::zero();
        let mut to_remove = Vec::new();

        for (&existing_lo, &existing_hi) in self.ranges.iter() {
            let existing = Interval::new(existing_lo, existing_hi);
            if !existing.adjacent(&incoming) {
                continue;
            }
            if let Some(overlap) = existing.intersection(&incoming) {
                covered_within += overlap.span();
            }
            merged_lo = merged_lo.min(existing_lo);
            merged_hi = merged_hi.max(existing_hi);
            to_remove.push(existing_lo);
        }

        for key in to_remove {
            self.ranges.remove(&key);
        }
        self.ranges.insert(merged_lo, merged_hi);

        let incoming_span = incoming.span();
        let delta = incoming_span.overflowing_sub(covered_within).0;
        tracing::trace!(
            lo = %lo, hi = %hi, delta = %delta,
            "interval-set merge"
        );
        delta
    }

    pub fn merge_interval(&mut self, iv: Interval) -> primitive_types::U256 {
        self.merge(iv.lo, iv.hi)
    }

    /// Remove `[lo, hi]` from the set, splitting any interval that only
    /// partially overlaps it. Returns the number of points newly
    /// uncovered.
    pub fn reduce(&mut self, lo: NodeTag, hi: NodeTag) -> primitive_types::U256 {
        let target = Interval::new(lo, hi);
        let mut delta = primitive_types::U256::zero();
        let mut to_remove = Vec::new();
        let mut to_insert = Vec::new();

        for (&existing_lo, &existing_hi) in self.ranges.iter() {
            let existing = Interval::new(existing_lo, existing_hi);
            let Some(overlap) = existing.intersection(&target) else {
                continue;
            };
            delta += overlap.span();
            to_remove.push(existing_lo);

            if existing_lo < overlap.lo {
                to_insert.push((existing_lo, overlap.lo.saturating_pred()));
            }
            if existing_hi > overlap.hi {
                to_insert.push((overlap.hi.saturating_succ(), existing_hi));
            }
        }

        for key in to_remove {
            self.ranges.remove(&key);
        }
        for (lo, hi) in to_insert {
            self.ranges.insert(lo, hi);
        }

        tracing::trace!(lo = %lo, hi = %hi, delta = %delta, "interval-set reduce");
        delta
    }

    pub fn reduce_interval(&mut self, iv: Interval) -> primitive_types::U256 {
        self.reduce(iv.lo, iv.hi)
    }

    /// The least interval whose `hi >= pt`, or `None` if every interval
    /// lies below `pt`.
    pub fn ge(&self, pt: NodeTag) -> Option<Interval> {
        if let Some((&lo, &hi)) = self.ranges.range(..=pt).next_back() {
            if hi >= pt {
                return Some(Interval::new(lo, hi));
            }
        }
        if pt == NodeTag::max_value() {
            return None;
        }
        self.ranges
            .range(pt.saturating_succ()..)
            .next()
            .map(|(&lo, &hi)| Interval::new(lo, hi))
    }

    /// The greatest interval whose `lo <= pt`, or `None` if every interval
    /// lies above `pt`.
    pub fn le(&self, pt: NodeTag) -> Option<Interval> {
        self.ranges
            .range(..=pt)
            .next_back()
            .map(|(&lo, &hi)| Interval::new(lo, hi))
    }

    pub fn first(&self) -> Option<Interval> {
        self.ranges.iter().next().map(|(&lo, &hi)| Interval::new(lo, hi))
    }

    pub fn last(&self) -> Option<Interval> {
        self.ranges.iter().next_back().map(|(&lo, &hi)| Interval::new(lo, hi))
    }

    /// Take and remove the first interval, truncated to at most `max_width`
    /// points. The untaken remainder, if any, stays in the set.
    ///
    /// Used by the fetcher to claim a bounded slice per request
    /// (`MAX_FETCH_RANGE`).
    pub fn claim_bounded(&mut self, max_width: primitive_types::U256) -> Option<Interval> {
        let (&lo, &hi) = self.ranges.iter().next()?;
        self.ranges.remove(&lo);

        let span = lo.span_to(hi);
        if span <= max_width {
            return Some(Interval::new(lo, hi));
        }

        let claim_hi_offset = max_width.overflowing_sub(primitive_types::U256::one()).0;
        let claim_hi = NodeTag(lo.0 + claim_hi_offset);
        let remainder_lo = claim_hi.saturating_succ();
        self.ranges.insert(remainder_lo, hi);
        Some(Interval::new(lo, claim_hi))
    }

    pub fn increasing_iter(&self) -> impl Iterator<Item = Interval> + '_ {
        self.ranges.iter().map(|(&lo, &hi)| Interval::new(lo, hi))
    }

    /// Total cardinality as a 256-bit integer plus chunk count (see
    /// [`TotalCount`]'s doc comment for the full-space convention).
    pub fn total(&self) -> TotalCount {
        let mut total = primitive_types::U256::zero();
        for (&lo, &hi) in self.ranges.iter() {
            total = total.overflowing_add(lo.span_to(hi)).0;
        }
        TotalCount { total, chunks: self.ranges.len() }
    }

    /// Fraction of the 256-bit space this set covers, as an `f64`
    /// approximation suitable for trigger-threshold comparisons
    /// (`healAccountsTrigger` and friends). Never exact at the top of the
    /// range due to `f64` precision, which is acceptable for a trigger.
    pub fn full_factor(&self) -> f64 {
        let count = self.total();
        if count.is_full_space() {
            return 1.0;
        }
        u256_to_f64(count.total) / TWO_POW_256
    }

    pub fn empty_factor(&self) -> f64 {
        1.0 - self.full_factor()
    }
}

const TWO_POW_256: f64 = 1.157_920_892_373_161_9e77;

fn u256_to_f64(x: primitive_types::U256) -> f64 {
    let mut result = 0f64;
    for limb in x.0.iter().rev() {
        result = result * (u64::MAX as f64 + 1.0) + (*limb as f64);
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use primitive_types::U256;

    fn tag(v: u64) -> NodeTag {
        NodeTag::from(v)
    }

    #[test]
    fn merge_coalesces_adjacent_intervals() {
        let mut set = IntervalSet::new();
        set.merge(tag(0), tag(9));
        set.merge(tag(10), tag(19));
        assert_eq!(set.chunk_count(), 1);
        assert_eq!(set.first(), Some(Interval::new(tag(0), tag(19))));
    }

    #[test]
    fn merge_delta_counts_only_new_points() {
        let mut set = IntervalSet::new();
        assert_eq!(set.merge(tag(0), tag(9)), U256::from(10u64));
        // overlapping merge only adds the new tail
        assert_eq!(set.merge(tag(5), tag(14)), U256::from(5u64));
    }

    #[test]
    fn merge_then_reduce_is_noop() {
        let mut set = IntervalSet::new();
        let delta_in = set.merge(tag(100), tag(199));
        let delta_out = set.reduce(tag(100), tag(199));
        assert_eq!(delta_in, delta_out);
        assert!(set.is_empty());
    }

    #[test]
    fn merge_is_commutative() {
        let mut a = IntervalSet::new();
        a.merge(tag(0), tag(9));
        a.merge(tag(20), tag(29));

        let mut b = IntervalSet::new();
        b.merge(tag(20), tag(29));
        b.merge(tag(0), tag(9));

        assert_eq!(a.increasing_iter().collect::<Vec<_>>(), b.increasing_iter().collect::<Vec<_>>());
    }

    #[test]
    fn reduce_splits_interval() {
        let mut set = IntervalSet::new();
        set.merge(tag(0), tag(99));
        let delta = set.reduce(tag(40), tag(59));
        assert_eq!(delta, U256::from(20u64));
        let parts: Vec<_> = set.increasing_iter().collect();
        assert_eq!(
            parts,
            vec![Interval::new(tag(0), tag(39)), Interval::new(tag(60), tag(99))]
        );
    }

    #[test]
    fn ge_and_le_locate_bounding_intervals() {
        let mut set = IntervalSet::new();
        set.merge(tag(0), tag(9));
        set.merge(tag(20), tag(29));

        assert_eq!(set.ge(tag(5)), Some(Interval::new(tag(0), tag(9))));
        assert_eq!(set.ge(tag(15)), Some(Interval::new(tag(20), tag(29))));
        assert_eq!(set.ge(tag(30)), None);

        assert_eq!(set.le(tag(25)), Some(Interval::new(tag(20), tag(29))));
        assert_eq!(set.le(tag(15)), Some(Interval::new(tag(0), tag(9))));
        assert_eq!(set.le(tag(0)), Some(Interval::new(tag(0), tag(9))));
    }

    #[test]
    fn claim_bounded_truncates_and_retains_remainder() {
        let mut set = IntervalSet::full();
        let claimed = set.claim_bounded(U256::from(1000u64)).unwrap();
        assert_eq!(claimed.lo, NodeTag::MIN);
        assert_eq!(claimed.span(), U256::from(1000u64));
        assert_eq!(set.first().unwrap().lo, claimed.hi.saturating_succ());
    }

    #[test]
    fn full_space_total_wraps_to_zero_with_one_chunk() {
        let set = IntervalSet::full();
        let count = set.total();
        assert!(count.is_full_space());
        assert_eq!(set.full_factor(), 1.0);
    }

    #[test]
    fn empty_set_total_is_zero_chunks() {
        let set = IntervalSet::new();
        assert!(set.total().is_empty());
        assert_eq!(set.full_factor(), 0.0);
    }

    proptest::proptest! {
        #[test]
        fn merge_matches_brute_force_count(
            ranges in proptest::collection::vec((0u64..5000, 0u64..5000), 1..20)
        ) {
            let mut set = IntervalSet::new();
            let mut covered = std::collections::HashSet::new();
            for (a, b) in ranges {
                let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
                set.merge(tag(lo), tag(hi));
                for v in lo..=hi {
                    covered.insert(v);
                }
            }
            let total = set.total();
            proptest::prop_assert_eq!(total.total, U256::from(covered.len() as u64));
        }
    }
}
