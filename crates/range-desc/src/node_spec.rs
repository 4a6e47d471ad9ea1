//! Node-spec records and range pretty-printing.
//!
//! A `NodeSpec` names a single trie node that healing (or the initial
//! boundary-proof import) still needs to fetch: the path from the trie
//! root (as nibbles) plus the partial node key already known from a
//! parent's child reference, if any.

use crate::node_key::NodeKey;
use crate::node_tag::NodeTag;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A request for a single missing trie node, identified by its path from
/// the root. `partial_key` is populated when a parent node referenced this
/// child by hash already; it lets a fetcher verify the reply without a
/// second proof.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeSpec {
    pub path: Vec<u8>,
    pub partial_key: Option<NodeKey>,
}

impl NodeSpec {
    pub fn new(path: Vec<u8>, partial_key: Option<NodeKey>) -> Self {
        Self { path, partial_key }
    }
}

impl fmt::Display for NodeSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "path=0x")?;
        for nibble in &self.path {
            write!(f, "{nibble:x}")?;
        }
        if let Some(key) = self.partial_key {
            write!(f, " key={key}")?;
        }
        Ok(())
    }
}

/// Render a closed `[lo, hi]` range of the 256-bit key space compactly,
/// truncating each bound to its leading 4 bytes the way `NodeKey`'s
/// `Debug` impl does, so large interval-set dumps stay readable.
pub fn fmt_range(lo: NodeTag, hi: NodeTag) -> String {
    format!("[{}.., ..{}]", short_hex(lo), short_hex(hi))
}

fn short_hex(tag: NodeTag) -> String {
    let key = tag.to_key();
    let mut s = String::from("0x");
    for byte in &key.0[..4] {
        s.push_str(&format!("{byte:02x}"));
    }
    s
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fmt_range_is_bounded() {
        let s = fmt_range(NodeTag::MIN, NodeTag::max_value());
        assert!(s.starts_with('['));
        assert!(s.contains(".."));
    }

    #[test]
    fn node_spec_display_renders_path() {
        let spec = NodeSpec::new(vec![0x1, 0x2, 0x3, 0x4], None);
        assert_eq!(spec.to_string(), "path=0x1234");
    }
}
