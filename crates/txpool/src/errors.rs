use crate::item::TxHash;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PoolError {
    #[error("transaction {0:?} already in pool")]
    DuplicateHash(TxHash),
    #[error("duplicate nonce {0} for sender")]
    DuplicateNonce(u64),
    #[error("no transaction at that sender/nonce")]
    NotFound,
    #[error("sender tree invariant violated: all/status mirrors disagree")]
    VfySenderRbTree,
    #[error("sender schedule left with an empty leaf instead of being collapsed")]
    VfySenderLeafEmpty,
    #[error("sender-tree total does not match status-tree total")]
    VfySenderTotal,
    #[error("status index missing the mirrored entry")]
    VfyStatusMissing,
    #[error("status index total does not match sender-tree total")]
    VfyStatusTotal,
    #[error("tip-cap index missing the mirrored entry")]
    VfyTipCapMissing,
    #[error("tip-cap index total does not match sender-tree total")]
    VfyTipCapTotal,
    #[error("tip index total does not match sender-tree total")]
    VfyTipTotal,
}
