//! A single closed interval `[lo, hi]` over the 256-bit key space.

use range_desc::NodeTag;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interval {
    pub lo: NodeTag,
    pub hi: NodeTag,
}

impl Interval {
    /// Panics if `lo > hi` — callers build intervals from validated bounds.
    pub fn new(lo: NodeTag, hi: NodeTag) -> Self {
        assert!(lo <= hi, "interval lo must not exceed hi");
        Interval { lo, hi }
    }

    pub fn full_range() -> Self {
        Interval { lo: NodeTag::MIN, hi: NodeTag::max_value() }
    }

    pub fn contains(&self, pt: NodeTag) -> bool {
        self.lo <= pt && pt <= self.hi
    }

    pub fn overlaps(&self, other: &Interval) -> bool {
        self.lo <= other.hi && other.lo <= self.hi
    }

    /// True when `self` and `other` touch with no gap, i.e. merging them
    /// would not skip any key.
    pub fn adjacent(&self, other: &Interval) -> bool {
        if self.overlaps(other) {
            return true;
        }
        if self.hi < NodeTag::max_value() && self.hi.saturating_succ() == other.lo {
            return true;
        }
        if other.hi < NodeTag::max_value() && other.hi.saturating_succ() == self.lo {
            return true;
        }
        false
    }

    /// Number of points this interval covers, as an unsigned 256-bit
    /// integer that wraps to zero when the interval is the entire space.
    pub fn span(&self) -> primitive_types::U256 {
        self.lo.span_to(self.hi)
    }

    /// Overlap of `self` with `other`, if any.
    pub fn intersection(&self, other: &Interval) -> Option<Interval> {
        if !self.overlaps(other) {
            return None;
        }
        let lo = self.lo.max(other.lo);
        let hi = self.hi.min(other.hi);
        Some(Interval::new(lo, hi))
    }
}

impl fmt::Debug for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", range_desc::fmt_range(self.lo, self.hi))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overlap_and_adjacency() {
        let a = Interval::new(NodeTag::from(0u64), NodeTag::from(9u64));
        let b = Interval::new(NodeTag::from(10u64), NodeTag::from(20u64));
        assert!(!a.overlaps(&b));
        assert!(a.adjacent(&b));

        let c = Interval::new(NodeTag::from(5u64), NodeTag::from(15u64));
        assert!(a.overlaps(&c));
    }

    #[test]
    fn intersection_is_symmetric() {
        let a = Interval::new(NodeTag::from(0u64), NodeTag::from(9u64));
        let b = Interval::new(NodeTag::from(5u64), NodeTag::from(15u64));
        assert_eq!(a.intersection(&b), b.intersection(&a));
        assert_eq!(
            a.intersection(&b),
            Some(Interval::new(NodeTag::from(5u64), NodeTag::from(9u64)))
        );
    }
}
