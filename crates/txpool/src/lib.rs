//! Mempool multi-index: every transaction is kept simultaneously indexed
//! by (sender, nonce), by (status, sender, nonce), by (effective-tip,
//! nonce), and by gas-tip-cap, with all four kept consistent under
//! insert/delete and under a full effective-tip recompute on base-fee
//! change.

mod errors;
mod item;
mod pool;
mod sender_index;
mod status_index;
mod tip_index;
mod tipcap_index;

pub use errors::PoolError;
pub use item::{effective_tip, new_item, Address, Item, TransactionItem, TxHash, TxStatus, ALL_STATUSES};
pub use pool::TxPool;
pub use sender_index::{SenderIndex, SenderSchedule};
pub use status_index::StatusIndex;
pub use tip_index::TipIndex;
pub use tipcap_index::TipCapIndex;
