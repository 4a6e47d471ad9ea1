//! Arithmetic view over a 32-byte node identifier.
//!
//! `NodeTag` wraps [`primitive_types::U256`] and is the type the
//! interval-set algebra is built on: `lo <= hi` comparisons, successor /
//! predecessor arithmetic, and the full-space constants `NodeTag::MIN`
//! (`0`) and `NodeTag::MAX` (`2²⁵⁶ − 1`). Bytes are big-endian, matching
//! `NodeKey`'s byte order, so `NodeTag::from(key)` and back is lossless.

use crate::node_key::NodeKey;
use primitive_types::U256;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeTag(pub U256);

impl NodeTag {
    pub const MIN: NodeTag = NodeTag(U256::zero());

    pub fn max_value() -> NodeTag {
        NodeTag(U256::MAX)
    }

    pub fn from_key(key: NodeKey) -> Self {
        NodeTag(U256::from_big_endian(&key.0))
    }

    pub fn to_key(self) -> NodeKey {
        let mut bytes = [0u8; 32];
        self.0.to_big_endian(&mut bytes);
        NodeKey(bytes)
    }

    /// `self + 1`, saturating at `MAX`.
    pub fn saturating_succ(self) -> Self {
        if self.0 == U256::MAX {
            self
        } else {
            NodeTag(self.0 + U256::one())
        }
    }

    /// `self - 1`, saturating at `MIN`.
    pub fn saturating_pred(self) -> Self {
        if self.0.is_zero() {
            self
        } else {
            NodeTag(self.0 - U256::one())
        }
    }

    /// Number of integers in the closed range `[self, other]`, as a u256.
    /// Caller must ensure `self <= other`.
    pub fn span_to(self, other: NodeTag) -> U256 {
        debug_assert!(self <= other);
        other.0 - self.0 + U256::one()
    }
}

impl From<NodeKey> for NodeTag {
    fn from(key: NodeKey) -> Self {
        NodeTag::from_key(key)
    }
}

impl From<NodeTag> for NodeKey {
    fn from(tag: NodeTag) -> Self {
        tag.to_key()
    }
}

impl From<u64> for NodeTag {
    fn from(v: u64) -> Self {
        NodeTag(U256::from(v))
    }
}

impl fmt::Debug for NodeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeTag(0x{:x})", self.0)
    }
}

impl fmt::Display for NodeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:x}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bijection_with_node_key_is_total() {
        let key = NodeKey([0xAB; 32]);
        let tag = NodeTag::from_key(key);
        assert_eq!(tag.to_key(), key);

        let tag2 = NodeTag(U256::from(12345u64));
        assert_eq!(NodeTag::from_key(tag2.to_key()), tag2);
    }

    #[test]
    fn arithmetic_is_big_endian() {
        let mut bytes = [0u8; 32];
        bytes[31] = 1;
        let tag = NodeTag::from_key(NodeKey(bytes));
        assert_eq!(tag.0, U256::one());
    }

    #[test]
    fn succ_pred_saturate_at_bounds() {
        assert_eq!(NodeTag::max_value().saturating_succ(), NodeTag::max_value());
        assert_eq!(NodeTag::MIN.saturating_pred(), NodeTag::MIN);
    }

    #[test]
    fn span_counts_inclusive_points() {
        let lo = NodeTag::from(0u64);
        let hi = NodeTag::from(9u64);
        assert_eq!(lo.span_to(hi), U256::from(10u64));
    }
}
