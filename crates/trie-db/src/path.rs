//! Root-to-leaf path queries and in-order successor/predecessor lookup.

use crate::db::HexaryTrieDb;
use crate::nibbles::Nibbles;
use crate::node::{NodeRef, TrieNode};
use range_desc::NodeKey;

/// The nodes visited walking from a trie's root towards `key`. `tail` is
/// empty iff the walk terminated at a leaf whose full path matches `key`
/// exactly; otherwise it holds the unmatched remainder (a dead end, used
/// for exclusion proofs).
#[derive(Debug, Clone)]
pub struct HexaryPath {
    pub root: NodeKey,
    pub key: NodeKey,
    pub visited: Vec<NodeKey>,
    pub tail: Nibbles,
}

impl HexaryPath {
    pub fn found(&self) -> bool {
        self.tail.is_empty()
    }
}

impl HexaryTrieDb {
    pub fn path(&self, root: NodeKey, key: NodeKey) -> HexaryPath {
        let target = Nibbles::from_key(key);
        let mut visited = Vec::new();
        let mut current = root;
        let mut depth = 0;

        loop {
            visited.push(current);
            let Some(node) = self.get(&current) else {
                return HexaryPath { root, key, visited, tail: target.slice(depth) };
            };
            match node {
                TrieNode::Empty => {
                    return HexaryPath { root, key, visited, tail: target.slice(depth) };
                }
                TrieNode::Leaf { path, .. } => {
                    let remaining = target.slice(depth);
                    let tail = if remaining == *path { Nibbles(vec![]) } else { remaining };
                    return HexaryPath { root, key, visited, tail };
                }
                TrieNode::Extension { path, child } => {
                    let remaining = target.slice(depth);
                    if !remaining.starts_with(path) {
                        return HexaryPath { root, key, visited, tail: remaining };
                    }
                    depth += path.len();
                    match child {
                        NodeRef::Hash(h) => current = *h,
                        NodeRef::Repair(_) => {
                            return HexaryPath { root, key, visited, tail: target.slice(depth) };
                        }
                    }
                }
                TrieNode::Branch { children, .. } => {
                    if depth >= target.len() {
                        return HexaryPath { root, key, visited, tail: Nibbles(vec![]) };
                    }
                    let nibble = target.at(depth) as usize;
                    match children[nibble] {
                        Some(NodeRef::Hash(h)) => {
                            depth += 1;
                            current = h;
                        }
                        _ => {
                            return HexaryPath {
                                root,
                                key,
                                visited,
                                tail: target.slice(depth),
                            };
                        }
                    }
                }
            }
        }
    }

    /// All leaves reachable from `root`, in key order. Used to derive
    /// `next`/`prev` — a full scan is acceptable at the scale this
    /// database operates at in-process (a pivot's account trie or one
    /// account's storage trie), and keeps successor logic simple to
    /// verify against the boundary-proof round-trip property.
    pub fn leaves_in_order(&self, root: NodeKey) -> Vec<(NodeKey, Vec<u8>)> {
        let mut out = Vec::new();
        self.collect_leaves(root, Nibbles(vec![]), &mut out);
        out
    }

    fn collect_leaves(&self, key: NodeKey, prefix: Nibbles, out: &mut Vec<(NodeKey, Vec<u8>)>) {
        let Some(node) = self.get(&key) else { return };
        match node {
            TrieNode::Empty => {}
            TrieNode::Leaf { path, value } => {
                let mut full = prefix.0.clone();
                full.extend(path.0.iter().copied());
                if let Some(leaf_key) = nibbles_to_key(&full) {
                    out.push((leaf_key, value.clone()));
                }
            }
            TrieNode::Extension { path, child } => {
                if let NodeRef::Hash(h) = child {
                    let mut full = prefix.0.clone();
                    full.extend(path.0.iter().copied());
                    self.collect_leaves(*h, Nibbles(full), out);
                }
            }
            TrieNode::Branch { children, value } => {
                if let Some(v) = value {
                    if let Some(leaf_key) = nibbles_to_key(&prefix.0) {
                        out.push((leaf_key, v.clone()));
                    }
                }
                for (nibble, child) in children.iter().enumerate() {
                    if let Some(NodeRef::Hash(h)) = child {
                        let mut full = prefix.0.clone();
                        full.push(nibble as u8);
                        self.collect_leaves(*h, Nibbles(full), out);
                    }
                }
            }
        }
    }

    /// The in-order successor leaf after `path`'s key, if any.
    pub fn next(&self, path: &HexaryPath) -> Option<HexaryPath> {
        let leaves = self.leaves_in_order(path.root);
        let idx = leaves.partition_point(|(k, _)| *k <= path.key);
        leaves.get(idx).map(|(k, _)| self.path(path.root, *k))
    }

    /// The in-order predecessor leaf before `path`'s key, if any.
    pub fn prev(&self, path: &HexaryPath) -> Option<HexaryPath> {
        let leaves = self.leaves_in_order(path.root);
        let idx = leaves.partition_point(|(k, _)| *k < path.key);
        if idx == 0 {
            None
        } else {
            leaves.get(idx - 1).map(|(k, _)| self.path(path.root, *k))
        }
    }
}

fn nibbles_to_key(nibbles: &[u8]) -> Option<NodeKey> {
    if nibbles.len() != 64 {
        return None;
    }
    let mut bytes = [0u8; 32];
    for (i, chunk) in nibbles.chunks(2).enumerate() {
        bytes[i] = (chunk[0] << 4) | chunk[1];
    }
    Some(NodeKey(bytes))
}
