//! `address → SenderSchedule`, where a schedule holds an "all" nonce-tree
//! plus one nonce-tree per status. Per the insert discipline in §4.8: a
//! mirror write failing after the "all" write succeeded is an unreachable
//! defect, not a recoverable error.

use crate::errors::PoolError;
use crate::item::{Address, Item, TxStatus, ALL_STATUSES};
use std::collections::BTreeMap;

#[derive(Debug, Default)]
pub struct SenderSchedule {
    pub all: BTreeMap<u64, Item>,
    pub by_status: [BTreeMap<u64, Item>; 3],
    pub gas_limit_total: u64,
    pub gas_limit_by_status: [u64; 3],
}

fn status_slot(status: TxStatus) -> usize {
    ALL_STATUSES.iter().position(|s| *s == status).expect("exhaustive status list")
}

impl SenderSchedule {
    pub fn size(&self) -> usize {
        self.all.len()
    }
}

#[derive(Debug, Default)]
pub struct SenderIndex {
    schedules: BTreeMap<Address, SenderSchedule>,
}

impl SenderIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, sender: Address) -> Option<&SenderSchedule> {
        self.schedules.get(&sender)
    }

    pub fn total_items(&self) -> usize {
        self.schedules.values().map(SenderSchedule::size).sum()
    }

    /// Insert `item` at `(item.sender, item.nonce)`. Rejects a duplicate
    /// nonce for that sender; panics if the status mirror disagrees with
    /// the "all" tree, which the insert discipline guarantees cannot
    /// happen in practice.
    pub fn insert(&mut self, item: Item) -> Result<(), PoolError> {
        let (sender, nonce, status, gas_limit) = {
            let guard = item.read().expect("item lock poisoned");
            (guard.sender, guard.nonce, guard.status, guard.gas_limit)
        };

        let schedule = self.schedules.entry(sender).or_default();
        if schedule.all.contains_key(&nonce) {
            return Err(PoolError::DuplicateNonce(nonce));
        }

        let slot = status_slot(status);
        let mirrored = schedule.by_status[slot].insert(nonce, item.clone());
        assert!(mirrored.is_none(), "status mirror had a stale entry at nonce {nonce}");
        schedule.all.insert(nonce, item);

        schedule.gas_limit_total += gas_limit;
        schedule.gas_limit_by_status[slot] += gas_limit;
        Ok(())
    }

    /// Remove the item at `(sender, nonce)`, collapsing the sender entry
    /// entirely once its "all" tree empties.
    pub fn delete(&mut self, sender: Address, nonce: u64) -> Result<Item, PoolError> {
        let schedule = self.schedules.get_mut(&sender).ok_or(PoolError::NotFound)?;
        let item = schedule.all.remove(&nonce).ok_or(PoolError::NotFound)?;

        let (status, gas_limit) = {
            let guard = item.read().expect("item lock poisoned");
            (guard.status, guard.gas_limit)
        };
        let slot = status_slot(status);
        let mirrored = schedule.by_status[slot].remove(&nonce);
        assert!(mirrored.is_some(), "status mirror missing entry at nonce {nonce}");

        schedule.gas_limit_total -= gas_limit;
        schedule.gas_limit_by_status[slot] -= gas_limit;

        if schedule.all.is_empty() {
            self.schedules.remove(&sender);
        }
        Ok(item)
    }

    /// Move an item from one status bucket to another within its
    /// sender's schedule, without touching the "all" tree.
    pub fn move_status(&mut self, sender: Address, nonce: u64, from: TxStatus, to: TxStatus) -> Result<(), PoolError> {
        let schedule = self.schedules.get_mut(&sender).ok_or(PoolError::NotFound)?;
        let from_slot = status_slot(from);
        let to_slot = status_slot(to);
        let item = schedule.by_status[from_slot].remove(&nonce).ok_or(PoolError::VfyStatusMissing)?;
        let gas_limit = item.read().expect("item lock poisoned").gas_limit;
        schedule.gas_limit_by_status[from_slot] -= gas_limit;
        schedule.by_status[to_slot].insert(nonce, item);
        schedule.gas_limit_by_status[to_slot] += gas_limit;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::{new_item, TransactionItem, TxHash};
    use std::sync::Arc;

    fn item(sender: Address, nonce: u64, hash_byte: u8) -> Item {
        new_item(TransactionItem::new(
            TxHash([hash_byte; 32]),
            sender,
            nonce,
            1,
            5,
            5,
            21_000,
            0,
            Arc::from(vec![]),
        ))
    }

    #[test]
    fn duplicate_nonce_is_rejected() {
        let mut index = SenderIndex::new();
        let s1 = Address([1; 20]);
        index.insert(item(s1, 0, 1)).unwrap();
        let err = index.insert(item(s1, 0, 2)).unwrap_err();
        assert!(matches!(err, PoolError::DuplicateNonce(0)));
    }

    #[test]
    fn delete_collapses_empty_schedule() {
        let mut index = SenderIndex::new();
        let s1 = Address([1; 20]);
        index.insert(item(s1, 0, 1)).unwrap();
        index.delete(s1, 0).unwrap();
        assert!(index.get(s1).is_none());
    }

    #[test]
    fn all_and_status_stay_mirrored() {
        let mut index = SenderIndex::new();
        let s1 = Address([1; 20]);
        index.insert(item(s1, 0, 1)).unwrap();
        index.insert(item(s1, 1, 2)).unwrap();
        let schedule = index.get(s1).unwrap();
        assert_eq!(schedule.size(), 2);
        assert_eq!(schedule.by_status[status_slot(TxStatus::Pending)].len(), 2);
    }
}
