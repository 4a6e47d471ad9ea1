//! 32-byte node identifiers.
//!
//! `NodeKey` is the hashable, byte-oriented view of a trie node or leaf
//! identifier (an account hash, a storage slot hash, or a trie node's
//! Keccak digest). `NodeTag` in [`crate::node_tag`] is the same 32 bytes
//! read as an unsigned 256-bit integer for arithmetic and interval
//! comparisons. The conversion between the two is total and lossless in
//! both directions — there is no bit pattern a `NodeKey` can hold that a
//! `NodeTag` cannot represent, and vice versa.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque 32-byte identifier for a trie node, account hash, or storage slot
/// hash.
///
/// Ordering is derived and is byte-lexicographic, which coincides with
/// big-endian numeric ordering — the same ordering `NodeTag` uses.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeKey(pub [u8; 32]);

impl NodeKey {
    pub const ZERO: NodeKey = NodeKey([0u8; 32]);
    pub const MAX: NodeKey = NodeKey([0xFFu8; 32]);

    pub fn new(bytes: [u8; 32]) -> Self {
        NodeKey(bytes)
    }

    pub fn from_slice(bytes: &[u8]) -> Option<Self> {
        if bytes.len() != 32 {
            return None;
        }
        let mut buf = [0u8; 32];
        buf.copy_from_slice(bytes);
        Some(NodeKey(buf))
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Saturating successor: `MAX` maps to itself.
    pub fn saturating_succ(&self) -> Self {
        let mut bytes = self.0;
        for byte in bytes.iter_mut().rev() {
            if *byte == 0xFF {
                *byte = 0;
            } else {
                *byte += 1;
                return NodeKey(bytes);
            }
        }
        NodeKey::MAX
    }

    /// Saturating predecessor: `ZERO` maps to itself.
    pub fn saturating_pred(&self) -> Self {
        let mut bytes = self.0;
        for byte in bytes.iter_mut().rev() {
            if *byte == 0x00 {
                *byte = 0xFF;
            } else {
                *byte -= 1;
                return NodeKey(bytes);
            }
        }
        NodeKey::ZERO
    }
}

impl fmt::Debug for NodeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x")?;
        for byte in &self.0[..4] {
            write!(f, "{byte:02x}")?;
        }
        write!(f, "…")
    }
}

impl fmt::Display for NodeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x")?;
        for byte in &self.0 {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

impl From<[u8; 32]> for NodeKey {
    fn from(bytes: [u8; 32]) -> Self {
        NodeKey(bytes)
    }
}

impl From<NodeKey> for [u8; 32] {
    fn from(key: NodeKey) -> Self {
        key.0
    }
}
