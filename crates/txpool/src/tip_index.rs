//! `effective-tip → nonce → item-list`. Keyed by the tip value itself, not
//! sender, since nonces are only unique per-sender — many items across
//! different senders can share a `(tip, nonce)` pair, kept as a
//! chronological list.

use crate::item::{effective_tip, Item};
use std::collections::BTreeMap;

#[derive(Debug, Default)]
pub struct TipIndex {
    tree: BTreeMap<u64, BTreeMap<u64, Vec<Item>>>,
    len: usize,
}

impl TipIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn insert(&mut self, tip: u64, nonce: u64, item: Item) {
        self.tree.entry(tip).or_default().entry(nonce).or_default().push(item);
        self.len += 1;
    }

    /// Remove one item identified by its nonce and hash from the `tip`
    /// bucket. Uses `Arc::ptr_eq`-style identity (by hash) rather than
    /// locking every candidate, since hash never changes after insert.
    pub fn remove(&mut self, tip: u64, nonce: u64, hash: crate::item::TxHash) -> Option<Item> {
        let nonce_tree = self.tree.get_mut(&tip)?;
        let list = nonce_tree.get_mut(&nonce)?;
        let position = list.iter().position(|item| item.read().expect("item lock poisoned").hash == hash)?;
        let item = list.remove(position);
        if list.is_empty() {
            nonce_tree.remove(&nonce);
        }
        if nonce_tree.is_empty() {
            self.tree.remove(&tip);
        }
        self.len -= 1;
        Some(item)
    }

    /// The first item (lowest nonce bucket, earliest in its list) at the
    /// smallest tip that is `>= pt`.
    pub fn ge(&self, pt: u64) -> Option<&Item> {
        self.tree.range(pt..).next().and_then(|(_, nonces)| nonces.values().next()).and_then(|list| list.first())
    }

    /// The cheapest item in the whole tree — the first candidate an
    /// eviction pass would drop.
    pub fn cheapest(&self) -> Option<&Item> {
        self.tree.values().next().and_then(|nonces| nonces.values().next()).and_then(|list| list.first())
    }

    /// Rebuild the whole tree with effective tips recomputed against a new
    /// base fee. O(N log N); the caller (the pool) holds the only
    /// reference to this index while it runs, so no external reader can
    /// observe a half-rebuilt tree.
    pub fn reorg(&mut self, base_fee: u64) {
        let mut rebuilt: BTreeMap<u64, BTreeMap<u64, Vec<Item>>> = BTreeMap::new();
        for (_, nonces) in std::mem::take(&mut self.tree) {
            for (nonce, list) in nonces {
                for item in list {
                    let new_tip = {
                        let mut guard = item.write().expect("item lock poisoned");
                        guard.effective_tip = effective_tip(guard.gas_tip_cap, guard.gas_fee_cap, base_fee);
                        guard.effective_tip
                    };
                    rebuilt.entry(new_tip).or_default().entry(nonce).or_default().push(item);
                }
            }
        }
        self.tree = rebuilt;
    }
}
