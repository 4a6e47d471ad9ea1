//! The three live node shapes of a hexary (Merkle-Patricia) trie, plus the
//! empty sentinel.

use crate::nibbles::Nibbles;
use crate::rlp;
use range_desc::NodeKey;

/// A reference to a child node. During ordinary operation every child is
/// addressed by its Keccak hash; `Repair` is a placeholder used while
/// [`crate::db::HexaryTrieDb::interpolate`] is synthesizing intermediate
/// nodes whose subtree isn't fully known yet (a boundary-proof gap). A
/// `Repair` reference left unresolved when a session is committed is the
/// `UnresolvedRepairNode` failure.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NodeRef {
    Hash(NodeKey),
    Repair(u64),
}

impl NodeRef {
    pub fn as_hash(&self) -> Option<NodeKey> {
        match self {
            NodeRef::Hash(key) => Some(*key),
            NodeRef::Repair(_) => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TrieNode {
    Empty,
    Leaf { path: Nibbles, value: Vec<u8> },
    Extension { path: Nibbles, child: NodeRef },
    Branch { children: Box<[Option<NodeRef>; 16]>, value: Option<Vec<u8>> },
}

impl TrieNode {
    pub fn rlp_encode(&self) -> Vec<u8> {
        match self {
            TrieNode::Empty => vec![0x80],
            TrieNode::Leaf { path, value } => {
                let encoded_path = path.encode_hex_prefix(true);
                rlp::encode_list(&[encoded_path, value.clone()])
            }
            TrieNode::Extension { path, child } => {
                let encoded_path = path.encode_hex_prefix(false);
                let child_bytes = child
                    .as_hash()
                    .map(|h| h.0.to_vec())
                    .expect("extension child must be resolved before encoding");
                rlp::encode_list(&[encoded_path, child_bytes])
            }
            TrieNode::Branch { children, value } => {
                let mut items: Vec<Vec<u8>> = Vec::with_capacity(17);
                for child in children.iter() {
                    match child {
                        Some(c) => items.push(
                            c.as_hash()
                                .map(|h| h.0.to_vec())
                                .expect("branch child must be resolved before encoding"),
                        ),
                        None => items.push(vec![]),
                    }
                }
                items.push(value.clone().unwrap_or_default());
                rlp::encode_list(&items)
            }
        }
    }

    /// Decode a node from its RLP representation. Structural ambiguity
    /// between leaf and extension is resolved by the hex-prefix flag on
    /// the first item; branch nodes are recognized by their fixed 17-item
    /// arity.
    pub fn rlp_decode(data: &[u8]) -> Option<TrieNode> {
        if data == [0x80] {
            return Some(TrieNode::Empty);
        }
        let items = rlp::decode_list(data)?;
        match items.len() {
            2 => {
                let (path, is_leaf) = Nibbles::decode_hex_prefix(&items[0]);
                if is_leaf {
                    Some(TrieNode::Leaf { path, value: items[1].clone() })
                } else {
                    let child = NodeKey::from_slice(&items[1])?;
                    Some(TrieNode::Extension { path, child: NodeRef::Hash(child) })
                }
            }
            17 => {
                let mut children: [Option<NodeRef>; 16] = [None; 16];
                for (i, item) in items.iter().take(16).enumerate() {
                    if !item.is_empty() {
                        children[i] = Some(NodeRef::Hash(NodeKey::from_slice(item)?));
                    }
                }
                let value = if items[16].is_empty() { None } else { Some(items[16].clone()) };
                Some(TrieNode::Branch { children: Box::new(children), value })
            }
            _ => None,
        }
    }

    /// Keccak256 of the node's RLP encoding; the empty node hashes to the
    /// well-known empty-trie root.
    pub fn hash(&self) -> NodeKey {
        if matches!(self, TrieNode::Empty) {
            return EMPTY_TRIE_ROOT;
        }
        rlp::keccak256(&self.rlp_encode())
    }

    /// Every child this node references, for reachability bookkeeping.
    pub fn child_refs(&self) -> Vec<NodeRef> {
        match self {
            TrieNode::Empty | TrieNode::Leaf { .. } => vec![],
            TrieNode::Extension { child, .. } => vec![*child],
            TrieNode::Branch { children, .. } => children.iter().filter_map(|c| *c).collect(),
        }
    }
}

/// Keccak256(RLP(""))  — the canonical empty-trie root.
pub const EMPTY_TRIE_ROOT: NodeKey = NodeKey([
    0x56, 0xe8, 0x1f, 0x17, 0x1b, 0xcc, 0x55, 0xa6, 0xff, 0x83, 0x45, 0xe6, 0x92, 0xc0, 0xf8, 0x6e,
    0x5b, 0x48, 0xe0, 0x1b, 0x99, 0x6c, 0xad, 0xc0, 0x01, 0x62, 0x2f, 0xb5, 0xe3, 0x63, 0xb4, 0x21,
]);

/// Keccak256("")  — the code hash of an externally-owned account, or of a
/// contract with no code.
pub const EMPTY_CODE_HASH: NodeKey = NodeKey([
    0xc5, 0xd2, 0x46, 0x01, 0x86, 0xf7, 0x23, 0x3c, 0x92, 0x7e, 0x7d, 0xb2, 0xdc, 0xc7, 0x03, 0xc0,
    0xe5, 0x00, 0xb6, 0x53, 0xca, 0x82, 0x27, 0x3b, 0x7b, 0xfa, 0xd8, 0x04, 0x5d, 0x85, 0xa4, 0x70,
]);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn leaf_encode_decode_roundtrip() {
        let node = TrieNode::Leaf { path: Nibbles(vec![1, 2, 3, 4]), value: vec![0xAB, 0xCD] };
        let encoded = node.rlp_encode();
        let decoded = TrieNode::rlp_decode(&encoded).unwrap();
        assert_eq!(decoded, node);
    }

    #[test]
    fn branch_encode_decode_roundtrip() {
        let mut children: [Option<NodeRef>; 16] = [None; 16];
        children[3] = Some(NodeRef::Hash(NodeKey([0xAA; 32])));
        children[9] = Some(NodeRef::Hash(NodeKey([0xBB; 32])));
        let node = TrieNode::Branch { children: Box::new(children), value: None };
        let encoded = node.rlp_encode();
        let decoded = TrieNode::rlp_decode(&encoded).unwrap();
        assert_eq!(decoded, node);
    }

    #[test]
    fn empty_node_hashes_to_known_root() {
        assert_eq!(TrieNode::Empty.hash(), EMPTY_TRIE_ROOT);
    }
}
