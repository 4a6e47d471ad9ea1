//! The hexary trie database: node storage, proof import/merge, and
//! dangling-reference inspection.

use crate::config::TrieDbConfig;
use crate::errors::TrieError;
use crate::nibbles::Nibbles;
use crate::node::{NodeRef, TrieNode, EMPTY_TRIE_ROOT};
use range_desc::{NodeKey, NodeSpec};
use std::collections::{HashMap, HashSet, VecDeque};

/// Result of [`HexaryTrieDb::inspect`]: the dangling child references
/// found, how many nodes were actually visited, and whether the plan-b
/// fallback pass was the one that produced the result.
#[derive(Debug, Clone, Default)]
pub struct InspectOutcome {
    pub dangling: Vec<NodeSpec>,
    pub visited: usize,
    pub used_plan_b: bool,
}

/// An in-memory hexary (Merkle-Patricia) trie database shared by every
/// pivot's account trie and per-account storage tries (callers key a
/// separate `HexaryTrieDb` per trie root group, or tag nodes externally —
/// this type itself is root-agnostic storage plus root-parameterized
/// traversal).
#[derive(Debug)]
pub struct HexaryTrieDb {
    nodes: HashMap<NodeKey, TrieNode>,
    config: TrieDbConfig,
}

impl HexaryTrieDb {
    pub fn new(config: TrieDbConfig) -> Self {
        let mut nodes = HashMap::new();
        nodes.insert(EMPTY_TRIE_ROOT, TrieNode::Empty);
        Self { nodes, config }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.len() <= 1
    }

    /// Discard every node, leaving only the empty-trie sentinel. Callers
    /// reset a trie shared across pivots before importing the first slice
    /// of a freshly adopted pivot, so stale nodes from a replaced pivot
    /// can't leak into the new one's root verification.
    pub fn reset(&mut self) {
        self.nodes.clear();
        self.nodes.insert(EMPTY_TRIE_ROOT, TrieNode::Empty);
    }

    pub fn get(&self, key: &NodeKey) -> Option<&TrieNode> {
        self.nodes.get(key)
    }

    pub fn contains(&self, key: &NodeKey) -> bool {
        self.nodes.contains_key(key)
    }

    /// Decode `rlp`, hash-check it against the hash of its own encoding,
    /// and insert it keyed by that hash. Every child this node references
    /// is recorded in `refs`, and the node's own hash in `seen` — the
    /// bookkeeping `merge_proofs` needs to find free-standing nodes.
    pub fn import(
        &mut self,
        rlp: &[u8],
        seen: &mut HashSet<NodeKey>,
        refs: &mut HashSet<NodeKey>,
    ) -> Result<NodeKey, TrieError> {
        let node = TrieNode::rlp_decode(rlp).ok_or(TrieError::RlpEncoding)?;
        let hash = node.hash();
        for child in node.child_refs() {
            if let Some(h) = child.as_hash() {
                refs.insert(h);
            }
        }
        seen.insert(hash);
        self.nodes.entry(hash).or_insert(node);
        Ok(hash)
    }

    /// Import every proof node, then delete any that are unreachable from
    /// `root` ("free-standing") unless configured to keep them.
    pub fn merge_proofs(&mut self, root: NodeKey, proofs: &[Vec<u8>]) -> Result<(), TrieError> {
        let mut seen = HashSet::new();
        let mut refs = HashSet::new();
        for proof in proofs {
            self.import(proof, &mut seen, &mut refs)?;
        }

        if self.config.allow_free_standing {
            return Ok(());
        }

        let reachable = self.reachable_from(root);
        for hash in seen {
            if hash != EMPTY_TRIE_ROOT && !reachable.contains(&hash) {
                tracing::trace!(node = %hash, "dropping free-standing proof node");
                self.nodes.remove(&hash);
            }
        }
        Ok(())
    }

    fn reachable_from(&self, root: NodeKey) -> HashSet<NodeKey> {
        let mut seen = HashSet::new();
        let mut queue = VecDeque::new();
        queue.push_back(root);
        while let Some(key) = queue.pop_front() {
            if !seen.insert(key) {
                continue;
            }
            if let Some(node) = self.nodes.get(&key) {
                for child in node.child_refs() {
                    if let Some(h) = child.as_hash() {
                        queue.push_back(h);
                    }
                }
            }
        }
        seen
    }

    /// Import a slice of account-range leaves (sorted, non-overlapping) and
    /// verify that merging them into whatever proof-seeded structure is
    /// already present reproduces `root`. `base` is the slice's requested
    /// origin, used to check the returned leaves don't undercut it.
    /// `bootstrap` clears any previously interpolated content first, for
    /// the first pivot of a fresh sync.
    pub fn interpolate(
        &mut self,
        root: NodeKey,
        base: NodeKey,
        leaves: &[(NodeKey, Vec<u8>)],
        bootstrap: bool,
    ) -> Result<NodeKey, TrieError> {
        self.interpolate_scoped(root, base, None, leaves, bootstrap)
    }

    /// Same as [`Self::interpolate`], scoped to a single account's storage
    /// trie. Ordering failures report the account the slots belong to.
    pub fn interpolate_storage(
        &mut self,
        account: NodeKey,
        root: NodeKey,
        base: NodeKey,
        leaves: &[(NodeKey, Vec<u8>)],
        bootstrap: bool,
    ) -> Result<NodeKey, TrieError> {
        self.interpolate_scoped(root, base, Some(account), leaves, bootstrap)
    }

    fn interpolate_scoped(
        &mut self,
        root: NodeKey,
        base: NodeKey,
        account: Option<NodeKey>,
        leaves: &[(NodeKey, Vec<u8>)],
        bootstrap: bool,
    ) -> Result<NodeKey, TrieError> {
        for window in leaves.windows(2) {
            if window[0].0 >= window[1].0 {
                let index = leaves
                    .iter()
                    .position(|l| l.0 == window[1].0)
                    .unwrap_or(0);
                return Err(match account {
                    Some(account) => TrieError::SlotsNotStrictlyIncreasing { account, index },
                    None => TrieError::AccountsNotStrictlyIncreasing { index },
                });
            }
        }

        if let Some(first) = leaves.first() {
            if first.0 < base {
                return Err(TrieError::AccountSmallerThanBase { base, got: first.0 });
            }
        }

        if bootstrap {
            self.nodes.clear();
            self.nodes.insert(EMPTY_TRIE_ROOT, TrieNode::Empty);
        }

        if leaves.is_empty() {
            if root != EMPTY_TRIE_ROOT {
                return Err(TrieError::BoundaryProofFailed { expected: root, computed: EMPTY_TRIE_ROOT });
            }
            return Ok(EMPTY_TRIE_ROOT);
        }

        let items: Vec<(Nibbles, Vec<u8>)> =
            leaves.iter().map(|(k, v)| (Nibbles::from_key(*k), v.clone())).collect();

        let computed = if bootstrap || !self.nodes.contains_key(&root) {
            self.build_node(&items, 0)?
        } else {
            self.splice_node(root, &items, 0)?
        };
        if computed != root {
            return Err(TrieError::BoundaryProofFailed { expected: root, computed });
        }
        Ok(computed)
    }

    /// Merge a leaf batch into a subtrie already known (from an earlier
    /// proof or interpolation pass) at `known`, reusing whichever sibling
    /// structure the new batch doesn't touch instead of rebuilding it from
    /// nothing. This is what lets successive range slices accumulate
    /// against one fixed pivot root instead of each only verifying in
    /// isolation.
    fn splice_node(&mut self, known: NodeKey, items: &[(Nibbles, Vec<u8>)], depth: usize) -> Result<NodeKey, TrieError> {
        if items.is_empty() {
            return Ok(known);
        }

        match self.nodes.get(&known).cloned() {
            None | Some(TrieNode::Empty) | Some(TrieNode::Leaf { .. }) => self.build_node(items, depth),
            Some(TrieNode::Branch { children, value }) => {
                let mut new_children: [Option<NodeRef>; 16] = [None; 16];
                let mut new_value = value;
                for nibble in 0u8..16 {
                    let group: Vec<_> = items
                        .iter()
                        .filter(|(k, _)| k.len() > depth && k.at(depth) == nibble)
                        .cloned()
                        .collect();
                    new_children[nibble as usize] = if !group.is_empty() {
                        let built = match children[nibble as usize].and_then(|c| c.as_hash()) {
                            Some(h) => self.splice_node(h, &group, depth + 1)?,
                            None => self.build_node(&group, depth + 1)?,
                        };
                        Some(NodeRef::Hash(built))
                    } else {
                        children[nibble as usize]
                    };
                }
                for (key, v) in items {
                    if key.len() == depth {
                        new_value = Some(v.clone());
                    }
                }
                let node = TrieNode::Branch { children: Box::new(new_children), value: new_value };
                Ok(self.insert_node(node))
            }
            Some(TrieNode::Extension { path, child }) => {
                let prefix_len = path.len();
                let shares_prefix = items.iter().all(|(k, _)| {
                    k.len() >= depth + prefix_len && k.slice_range(depth, depth + prefix_len) == path
                });
                if !shares_prefix {
                    let id = u64::from_be_bytes(known.0[0..8].try_into().expect("8-byte prefix of a 32-byte hash"));
                    return Err(TrieError::UnresolvedRepairNode(id));
                }
                let built = match child.as_hash() {
                    Some(h) => self.splice_node(h, items, depth + prefix_len)?,
                    None => self.build_node(items, depth + prefix_len)?,
                };
                let node = TrieNode::Extension { path, child: NodeRef::Hash(built) };
                Ok(self.insert_node(node))
            }
        }
    }

    pub(crate) fn build_node(&mut self, items: &[(Nibbles, Vec<u8>)], depth: usize) -> Result<NodeKey, TrieError> {
        if items.is_empty() {
            return Ok(EMPTY_TRIE_ROOT);
        }

        if items.len() == 1 {
            let (key, value) = &items[0];
            let node = TrieNode::Leaf { path: key.slice(depth), value: value.clone() };
            return Ok(self.insert_node(node));
        }

        let first = &items[0].0;
        let common_len = items[1..]
            .iter()
            .map(|(k, _)| k.slice(depth).common_prefix_len(&first.slice(depth)))
            .min()
            .unwrap_or(0);

        if common_len > 0 {
            let prefix = first.slice_range(depth, depth + common_len);
            let child = self.build_node(items, depth + common_len)?;
            let node = TrieNode::Extension { path: prefix, child: NodeRef::Hash(child) };
            return Ok(self.insert_node(node));
        }

        let mut children: [Option<NodeRef>; 16] = [None; 16];
        let mut value = None;
        for nibble in 0u8..16 {
            let group: Vec<_> =
                items.iter().filter(|(k, _)| k.len() > depth && k.at(depth) == nibble).cloned().collect();
            if !group.is_empty() {
                children[nibble as usize] = Some(NodeRef::Hash(self.build_node(&group, depth + 1)?));
            }
        }
        for (key, v) in items {
            if key.len() == depth {
                value = Some(v.clone());
                break;
            }
        }
        let node = TrieNode::Branch { children: Box::new(children), value };
        Ok(self.insert_node(node))
    }

    fn insert_node(&mut self, node: TrieNode) -> NodeKey {
        let hash = node.hash();
        self.nodes.entry(hash).or_insert(node);
        hash
    }

    /// BFS the trie rooted at `root` collecting references to children not
    /// present in the database. `seed_paths` (if non-empty) restricts the
    /// starting points to specific known nodes instead of the whole trie —
    /// used by the healer to re-check only nodes it previously found
    /// dangling. Falls back to a depth-bounded exploration of the whole
    /// trie (`plan_b_level` nibbles deep) when the direct pass is clean,
    /// since a direct pass seeded by stale check-nodes can miss newly
    /// dangling references elsewhere.
    pub fn inspect(&self, root: NodeKey, seed_paths: &[NodeSpec]) -> InspectOutcome {
        let direct = self.inspect_bounded(root, seed_paths, None, self.config.heal_inspection_batch);
        if !direct.dangling.is_empty() || self.config.plan_b_level.is_none() {
            return direct;
        }
        let level = self.config.plan_b_level.unwrap();
        let mut fallback = self.inspect_bounded(root, &[], Some(level), usize::MAX);
        fallback.used_plan_b = true;
        fallback
    }

    fn inspect_bounded(
        &self,
        root: NodeKey,
        seed_paths: &[NodeSpec],
        max_depth: Option<usize>,
        visit_budget: usize,
    ) -> InspectOutcome {
        let mut queue: VecDeque<(NodeKey, Vec<u8>)> = VecDeque::new();
        if seed_paths.is_empty() {
            queue.push_back((root, vec![]));
        } else {
            for spec in seed_paths {
                let key = match spec.partial_key {
                    Some(k) => k,
                    None => match self.resolve_ref_at_path(root, &spec.path) {
                        Some(k) => k,
                        None => continue,
                    },
                };
                queue.push_back((key, spec.path.clone()));
            }
        }

        let mut visited = 0usize;
        let mut dangling = Vec::new();
        let mut seen_keys = HashSet::new();

        while let Some((key, path)) = queue.pop_front() {
            if visited >= visit_budget {
                break;
            }
            if let Some(level) = max_depth {
                if path.len() > level {
                    continue;
                }
            }
            if !seen_keys.insert(key) {
                continue;
            }
            visited += 1;

            match self.nodes.get(&key) {
                None => {
                    if key != EMPTY_TRIE_ROOT {
                        dangling.push(NodeSpec::new(path, Some(key)));
                    }
                }
                Some(TrieNode::Branch { children, .. }) => {
                    for (nibble, child) in children.iter().enumerate() {
                        if let Some(NodeRef::Hash(h)) = child {
                            let mut child_path = path.clone();
                            child_path.push(nibble as u8);
                            queue.push_back((*h, child_path));
                        }
                    }
                }
                Some(TrieNode::Extension { path: ext_path, child }) => {
                    if let NodeRef::Hash(h) = child {
                        let mut child_path = path.clone();
                        child_path.extend(ext_path.0.iter().copied());
                        queue.push_back((*h, child_path));
                    }
                }
                Some(TrieNode::Leaf { .. }) | Some(TrieNode::Empty) => {}
            }
        }

        InspectOutcome { dangling, visited, used_plan_b: false }
    }

    /// Resolve the node *reference* a nibble path leads to from `root`,
    /// whether or not that node is actually present in the database.
    pub(crate) fn resolve_ref_at_path(&self, root: NodeKey, path: &[u8]) -> Option<NodeKey> {
        let mut current = root;
        let mut idx = 0;
        while idx < path.len() {
            let node = self.nodes.get(&current)?;
            match node {
                TrieNode::Branch { children, .. } => {
                    let child = children[path[idx] as usize]?;
                    current = child.as_hash()?;
                    idx += 1;
                }
                TrieNode::Extension { path: ext_path, child } => {
                    let remaining = &path[idx..];
                    if remaining.len() < ext_path.len() || remaining[..ext_path.len()] != ext_path.0[..] {
                        return None;
                    }
                    current = child.as_hash()?;
                    idx += ext_path.len();
                }
                _ => return None,
            }
        }
        Some(current)
    }

    pub(crate) fn nodes_map(&self) -> &HashMap<NodeKey, TrieNode> {
        &self.nodes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf_key(b: u8) -> NodeKey {
        NodeKey([b; 32])
    }

    #[test]
    fn interpolate_single_leaf_roots_correctly() {
        let mut db = HexaryTrieDb::new(TrieDbConfig::default());
        let leaves = vec![(leaf_key(1), vec![0xAA])];
        let node = TrieNode::Leaf { path: Nibbles::from_key(leaf_key(1)), value: vec![0xAA] };
        let expected_root = node.hash();
        let root = db.interpolate(expected_root, NodeKey::ZERO, &leaves, true).unwrap();
        assert_eq!(root, expected_root);
    }

    #[test]
    fn interpolate_rejects_out_of_order_leaves() {
        let mut db = HexaryTrieDb::new(TrieDbConfig::default());
        let leaves = vec![(leaf_key(9), vec![1]), (leaf_key(1), vec![2])];
        let result = db.interpolate(EMPTY_TRIE_ROOT, NodeKey::ZERO, &leaves, true);
        assert!(matches!(result, Err(TrieError::AccountsNotStrictlyIncreasing { .. })));
    }

    #[test]
    fn interpolate_rejects_wrong_root() {
        let mut db = HexaryTrieDb::new(TrieDbConfig::default());
        let leaves = vec![(leaf_key(1), vec![0xAA])];
        let result = db.interpolate(NodeKey([0x99; 32]), NodeKey::ZERO, &leaves, true);
        assert!(matches!(result, Err(TrieError::BoundaryProofFailed { .. })));
    }

    #[test]
    fn interpolate_rejects_leaf_below_requested_base() {
        let mut db = HexaryTrieDb::new(TrieDbConfig::default());
        let leaves = vec![(leaf_key(1), vec![0xAA])];
        let result = db.interpolate(EMPTY_TRIE_ROOT, leaf_key(5), &leaves, true);
        assert!(matches!(result, Err(TrieError::AccountSmallerThanBase { .. })));
    }

    #[test]
    fn interpolate_storage_reports_account_on_out_of_order_slots() {
        let mut db = HexaryTrieDb::new(TrieDbConfig::default());
        let account = leaf_key(0xAC);
        let leaves = vec![(leaf_key(9), vec![1]), (leaf_key(1), vec![2])];
        let result = db.interpolate_storage(account, EMPTY_TRIE_ROOT, NodeKey::ZERO, &leaves, true);
        assert!(matches!(result, Err(TrieError::SlotsNotStrictlyIncreasing { account: a, .. }) if a == account));
    }

    // A second call against an already-known root reuses the untouched
    // sibling subtrees instead of rebuilding the whole thing, so splicing
    // in the very same leaf set again must reproduce the identical root.
    #[test]
    fn interpolate_splice_reproduces_root_of_already_known_trie() {
        let mut db = HexaryTrieDb::new(TrieDbConfig::default());
        let leaves = vec![(leaf_key(1), vec![1]), (leaf_key(2), vec![2]), (leaf_key(3), vec![3])];
        let items: Vec<(Nibbles, Vec<u8>)> =
            leaves.iter().map(|(k, v)| (Nibbles::from_key(*k), v.clone())).collect();
        let whole_root = db.build_node(&items, 0).unwrap();

        let spliced = db.interpolate(whole_root, NodeKey::ZERO, &leaves, false).unwrap();
        assert_eq!(spliced, whole_root);
    }

    #[test]
    fn interpolate_splice_reports_unresolved_repair_node_on_prefix_mismatch() {
        let mut db = HexaryTrieDb::new(TrieDbConfig::default());
        // An extension node whose stored prefix disagrees with every key in
        // the incoming batch at the same depth: neither the known
        // structure nor the new leaves can resolve it.
        let child = TrieNode::Leaf { path: Nibbles(vec![0xF]), value: vec![1] };
        let child_hash = db.insert_node(child);
        let ext = TrieNode::Extension { path: Nibbles(vec![0, 0]), child: NodeRef::Hash(child_hash) };
        let ext_hash = db.insert_node(ext);

        let mismatched = vec![(leaf_key(0xFF), vec![2])];
        let items: Vec<(Nibbles, Vec<u8>)> =
            mismatched.iter().map(|(k, v)| (Nibbles::from_key(*k), v.clone())).collect();
        let result = db.splice_node(ext_hash, &items, 0);
        assert!(matches!(result, Err(TrieError::UnresolvedRepairNode(_))));
    }

    #[test]
    fn merge_proofs_drops_free_standing_nodes() {
        let mut db = HexaryTrieDb::new(TrieDbConfig::default());
        let unrelated = TrieNode::Leaf { path: Nibbles(vec![1, 2]), value: vec![9] };
        let unrelated_rlp = unrelated.rlp_encode();
        let unrelated_hash = unrelated.hash();

        let root_node = TrieNode::Leaf { path: Nibbles::from_key(leaf_key(5)), value: vec![5] };
        let root_hash = root_node.hash();
        let root_rlp = root_node.rlp_encode();

        db.merge_proofs(root_hash, &[root_rlp, unrelated_rlp]).unwrap();

        assert!(db.contains(&root_hash));
        assert!(!db.contains(&unrelated_hash));
    }

    #[test]
    fn inspect_finds_dangling_branch_child() {
        let mut db = HexaryTrieDb::new(TrieDbConfig::default());
        let missing = NodeKey([0x77; 32]);
        let mut children: [Option<NodeRef>; 16] = [None; 16];
        children[3] = Some(NodeRef::Hash(missing));
        let branch = TrieNode::Branch { children: Box::new(children), value: None };
        let root = branch.hash();
        db.nodes.insert(root, branch);

        let outcome = db.inspect(root, &[]);
        assert_eq!(outcome.dangling.len(), 1);
        assert_eq!(outcome.dangling[0].partial_key, Some(missing));
        assert_eq!(outcome.dangling[0].path, vec![3]);
    }

    #[test]
    fn inspect_is_empty_for_a_fully_resolved_trie() {
        let mut db = HexaryTrieDb::new(TrieDbConfig::default());
        let leaves = vec![(leaf_key(1), vec![1]), (leaf_key(2), vec![2])];
        let items: Vec<(Nibbles, Vec<u8>)> =
            leaves.iter().map(|(k, v)| (Nibbles::from_key(*k), v.clone())).collect();
        let root = db.build_node(&items, 0).unwrap();

        let outcome = db.inspect(root, &[]);
        assert!(outcome.dangling.is_empty());
    }

    #[test]
    fn inspect_plan_b_falls_back_when_direct_seeds_are_stale() {
        let mut db = HexaryTrieDb::new(TrieDbConfig::default());
        let missing = NodeKey([0x55; 32]);
        let mut children: [Option<NodeRef>; 16] = [None; 16];
        children[1] = Some(NodeRef::Hash(missing));
        let branch = TrieNode::Branch { children: Box::new(children), value: None };
        let root = branch.hash();
        db.nodes.insert(root, branch);

        // Stale seed pointing at an already-resolved (nonexistent) path.
        let stale_seed = NodeSpec::new(vec![9], Some(EMPTY_TRIE_ROOT));
        let outcome = db.inspect(root, &[stale_seed]);
        assert!(outcome.used_plan_b);
        assert_eq!(outcome.dangling.len(), 1);
    }
}
