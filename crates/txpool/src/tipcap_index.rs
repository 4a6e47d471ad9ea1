//! `gas-tip-cap → item-list`, used to locate remotes whose price dropped
//! below a threshold (e.g. after a base-fee increase makes them
//! unprofitable to include).

use crate::item::{Item, TxHash};
use std::collections::BTreeMap;

#[derive(Debug, Default)]
pub struct TipCapIndex {
    tree: BTreeMap<u64, Vec<Item>>,
    len: usize,
}

impl TipCapIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn insert(&mut self, gas_tip_cap: u64, item: Item) {
        self.tree.entry(gas_tip_cap).or_default().push(item);
        self.len += 1;
    }

    pub fn remove(&mut self, gas_tip_cap: u64, hash: TxHash) -> Option<Item> {
        let list = self.tree.get_mut(&gas_tip_cap)?;
        let position = list.iter().position(|item| item.read().expect("item lock poisoned").hash == hash)?;
        let item = list.remove(position);
        if list.is_empty() {
            self.tree.remove(&gas_tip_cap);
        }
        self.len -= 1;
        Some(item)
    }

    /// Every item whose gas-tip-cap is strictly below `threshold`.
    pub fn lt(&self, threshold: u64) -> Vec<&Item> {
        self.tree.range(..threshold).flat_map(|(_, list)| list.iter()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::{new_item, Address, TransactionItem};
    use std::sync::Arc;

    fn item(hash: u8, gas_tip_cap: u64) -> Item {
        new_item(TransactionItem::new(
            TxHash([hash; 32]),
            Address([1; 20]),
            0,
            1,
            gas_tip_cap,
            gas_tip_cap,
            21_000,
            0,
            Arc::from(vec![]),
        ))
    }

    #[test]
    fn lt_returns_only_items_below_threshold() {
        let mut index = TipCapIndex::new();
        index.insert(5, item(1, 5));
        index.insert(7, item(2, 7));
        let below = index.lt(6);
        assert_eq!(below.len(), 1);
        assert_eq!(below[0].read().unwrap().hash, TxHash([1; 32]));
    }
}
