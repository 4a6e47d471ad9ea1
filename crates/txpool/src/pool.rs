//! The aggregate pool: inserts/deletes hit all four indexes in one
//! transactional step, queries walk whichever index fits, and a base-fee
//! change triggers a full tip-index rebuild.

use crate::errors::PoolError;
use crate::item::{new_item, Address, Item, TransactionItem, TxHash, TxStatus};
use crate::sender_index::{SenderIndex, SenderSchedule};
use crate::status_index::StatusIndex;
use crate::tip_index::TipIndex;
use crate::tipcap_index::TipCapIndex;
use std::collections::HashMap;

#[derive(Debug, Default)]
pub struct TxPool {
    by_hash: HashMap<TxHash, Item>,
    sender: SenderIndex,
    status: StatusIndex,
    tip: TipIndex,
    tipcap: TipCapIndex,
    base_fee: u64,
}

impl TxPool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.by_hash.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_hash.is_empty()
    }

    pub fn base_fee(&self) -> u64 {
        self.base_fee
    }

    pub fn contains(&self, hash: TxHash) -> bool {
        self.by_hash.contains_key(&hash)
    }

    pub fn sender_schedule(&self, sender: Address) -> Option<&SenderSchedule> {
        self.sender.get(sender)
    }

    pub fn tip_ge(&self, pt: u64) -> Option<&Item> {
        self.tip.ge(pt)
    }

    pub fn tip_cheapest(&self) -> Option<&Item> {
        self.tip.cheapest()
    }

    pub fn tipcap_senders_below(&self, threshold: u64) -> Vec<Address> {
        self.tipcap.lt(threshold).into_iter().map(|item| item.read().expect("item lock poisoned").sender).collect()
    }

    /// Admit a validated item into all four indexes. The item's effective
    /// tip is computed against the pool's current base fee before insert.
    pub fn insert(&mut self, mut descriptor: TransactionItem) -> Result<(), PoolError> {
        if self.by_hash.contains_key(&descriptor.hash) {
            return Err(PoolError::DuplicateHash(descriptor.hash));
        }
        descriptor.effective_tip = crate::item::effective_tip(descriptor.gas_tip_cap, descriptor.gas_fee_cap, self.base_fee);

        let (hash, nonce, tip, gas_tip_cap) =
            (descriptor.hash, descriptor.nonce, descriptor.effective_tip, descriptor.gas_tip_cap);
        let item = new_item(descriptor);

        self.sender.insert(item.clone())?;
        self.status.insert(item.clone());
        self.tip.insert(tip, nonce, item.clone());
        self.tipcap.insert(gas_tip_cap, item.clone());
        self.by_hash.insert(hash, item);
        tracing::trace!(?hash, nonce, effective_tip = tip, "admitted transaction into pool");
        Ok(())
    }

    /// Remove the item at `(sender, nonce)` from every index.
    pub fn delete(&mut self, sender: Address, nonce: u64) -> Result<Item, PoolError> {
        let item = self.sender.delete(sender, nonce)?;
        let (hash, status, tip, gas_tip_cap) = {
            let guard = item.read().expect("item lock poisoned");
            (guard.hash, guard.status, guard.effective_tip, guard.gas_tip_cap)
        };
        self.status.delete(status, sender, nonce)?;
        self.tip.remove(tip, nonce, hash);
        self.tipcap.remove(gas_tip_cap, hash);
        self.by_hash.remove(&hash);
        tracing::trace!(?hash, nonce, "evicted transaction from pool");
        Ok(item)
    }

    /// Move an item between status buckets without touching the other
    /// three indexes (their keys don't depend on status).
    pub fn set_status(&mut self, sender: Address, nonce: u64, to: TxStatus) -> Result<(), PoolError> {
        let item = self
            .sender
            .get(sender)
            .and_then(|schedule| schedule.all.get(&nonce))
            .cloned()
            .ok_or(PoolError::NotFound)?;
        let (hash, from) = {
            let guard = item.read().expect("item lock poisoned");
            (guard.hash, guard.status)
        };
        if from == to {
            return Ok(());
        }
        self.sender.move_status(sender, nonce, from, to)?;
        let moved = self.status.delete(from, sender, nonce)?;
        debug_assert_eq!(moved.read().expect("item lock poisoned").hash, hash);
        moved.write().expect("item lock poisoned").status = to;
        self.status.insert(moved);
        Ok(())
    }

    /// Recompute every item's effective tip against a new base fee and
    /// rebuild the tip index. Sender/status/tip-cap indexes don't key on
    /// tip, so they need no structural change — only the shared item's
    /// `effective_tip` field, which `TipIndex::reorg` updates in place.
    pub fn set_base_fee(&mut self, base_fee: u64) {
        tracing::info!(base_fee, items = self.by_hash.len(), "base fee changed, reorging tip index");
        self.base_fee = base_fee;
        self.tip.reorg(base_fee);
    }

    /// Cross-index consistency check (§8 property 5): every index agrees
    /// on the total item count.
    pub fn verify_consistent(&self) -> Result<(), PoolError> {
        let total = self.by_hash.len();
        if self.sender.total_items() != total {
            return Err(PoolError::VfySenderTotal);
        }
        if self.status.total_items() != total {
            return Err(PoolError::VfyStatusTotal);
        }
        if self.tip.len() != total {
            return Err(PoolError::VfyTipTotal);
        }
        if self.tipcap.len() != total {
            return Err(PoolError::VfyTipCapTotal);
        }
        Ok(())
    }
}
