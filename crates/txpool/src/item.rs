use std::fmt;
use std::sync::{Arc, RwLock};

/// 20-byte account address.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Address(pub [u8; 20]);

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x")?;
        for byte in &self.0[..4] {
            write!(f, "{byte:02x}")?;
        }
        write!(f, "…")
    }
}

/// 32-byte transaction hash.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TxHash(pub [u8; 32]);

impl fmt::Debug for TxHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x")?;
        for byte in &self.0[..4] {
            write!(f, "{byte:02x}")?;
        }
        write!(f, "…")
    }
}

/// Lifecycle state of a pooled transaction. `Pending` is newly admitted and
/// not yet promotable, `Staged` is nonce-contiguous and eligible for
/// packing, `Packed` is included in a block template.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TxStatus {
    Pending,
    Staged,
    Packed,
}

pub const ALL_STATUSES: [TxStatus; 3] = [TxStatus::Pending, TxStatus::Staged, TxStatus::Packed];

/// `min(gas-tip-cap, gas-fee-cap − base-fee)`, clamped to zero.
pub fn effective_tip(gas_tip_cap: u64, gas_fee_cap: u64, base_fee: u64) -> u64 {
    gas_tip_cap.min(gas_fee_cap.saturating_sub(base_fee))
}

/// A pooled transaction. Every field but `status` and `effective_tip` is
/// fixed at construction; those two are updated in place (status on
/// promotion/demotion, effective tip on a base-fee change) behind the
/// shared handle every index holds.
#[derive(Debug)]
pub struct TransactionItem {
    pub hash: TxHash,
    pub sender: Address,
    pub nonce: u64,
    pub gas_price: u64,
    pub gas_tip_cap: u64,
    pub gas_fee_cap: u64,
    pub gas_limit: u64,
    pub status: TxStatus,
    pub effective_tip: u64,
    pub timestamp: u64,
    pub payload: Arc<[u8]>,
}

impl TransactionItem {
    pub fn new(
        hash: TxHash,
        sender: Address,
        nonce: u64,
        gas_price: u64,
        gas_tip_cap: u64,
        gas_fee_cap: u64,
        gas_limit: u64,
        timestamp: u64,
        payload: Arc<[u8]>,
    ) -> Self {
        Self {
            hash,
            sender,
            nonce,
            gas_price,
            gas_tip_cap,
            gas_fee_cap,
            gas_limit,
            status: TxStatus::Pending,
            effective_tip: effective_tip(gas_tip_cap, gas_fee_cap, 0),
            timestamp,
            payload,
        }
    }
}

/// Shared handle every index holds a clone of. A `RwLock` rather than a
/// fresh immutable copy per update, since a base-fee reorg touches every
/// item in the pool and the sender/status indices must see the same
/// updated `effective_tip` without being rebuilt themselves.
pub type Item = Arc<RwLock<TransactionItem>>;

pub fn new_item(item: TransactionItem) -> Item {
    Arc::new(RwLock::new(item))
}
