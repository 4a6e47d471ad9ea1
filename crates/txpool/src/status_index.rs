//! `status → sender → nonce → item`, mirroring sender-index membership at
//! a different ordering and tracking accumulated gas-limit per
//! `(status, sender)` bucket for packing-plan sizing.

use crate::errors::PoolError;
use crate::item::{Address, Item, TxStatus, ALL_STATUSES};
use std::collections::BTreeMap;

#[derive(Debug, Default)]
struct AddressBucket {
    nonces: BTreeMap<u64, Item>,
    gas_limit: u64,
}

#[derive(Debug, Default)]
pub struct StatusIndex {
    trees: [BTreeMap<Address, AddressBucket>; 3],
}

fn slot(status: TxStatus) -> usize {
    ALL_STATUSES.iter().position(|s| *s == status).expect("exhaustive status list")
}

impl StatusIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn total_items(&self) -> usize {
        self.trees.iter().map(|t| t.values().map(|b| b.nonces.len()).sum::<usize>()).sum()
    }

    pub fn gas_limit_for(&self, status: TxStatus, sender: Address) -> u64 {
        self.trees[slot(status)].get(&sender).map(|b| b.gas_limit).unwrap_or(0)
    }

    pub fn insert(&mut self, item: Item) {
        let (sender, nonce, status, gas_limit) = {
            let guard = item.read().expect("item lock poisoned");
            (guard.sender, guard.nonce, guard.status, guard.gas_limit)
        };
        let bucket = self.trees[slot(status)].entry(sender).or_default();
        bucket.nonces.insert(nonce, item);
        bucket.gas_limit += gas_limit;
    }

    pub fn delete(&mut self, status: TxStatus, sender: Address, nonce: u64) -> Result<Item, PoolError> {
        let tree = &mut self.trees[slot(status)];
        let bucket = tree.get_mut(&sender).ok_or(PoolError::VfyStatusMissing)?;
        let item = bucket.nonces.remove(&nonce).ok_or(PoolError::VfyStatusMissing)?;
        let gas_limit = item.read().expect("item lock poisoned").gas_limit;
        bucket.gas_limit -= gas_limit;
        if bucket.nonces.is_empty() {
            tree.remove(&sender);
        }
        Ok(item)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::{new_item, TransactionItem, TxHash};
    use std::sync::Arc;

    #[test]
    fn insert_and_delete_round_trips_through_all_buckets() {
        let mut index = StatusIndex::new();
        let sender = Address([9; 20]);
        let item = new_item(TransactionItem::new(TxHash([1; 32]), sender, 0, 1, 5, 5, 21_000, 0, Arc::from(vec![])));
        index.insert(item.clone());
        assert_eq!(index.total_items(), 1);
        assert_eq!(index.gas_limit_for(TxStatus::Pending, sender), 21_000);

        index.delete(TxStatus::Pending, sender, 0).unwrap();
        assert_eq!(index.total_items(), 0);
        assert_eq!(index.gas_limit_for(TxStatus::Pending, sender), 0);
    }
}
