use range_desc::NodeKey;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TrieError {
    #[error("malformed RLP node encoding")]
    RlpEncoding,

    #[error("accounts in range reply are not strictly increasing at index {index}")]
    AccountsNotStrictlyIncreasing { index: usize },

    #[error("first account {got} is smaller than requested base {base}")]
    AccountSmallerThanBase { base: NodeKey, got: NodeKey },

    #[error("storage slots for account {account} are not strictly increasing at index {index}")]
    SlotsNotStrictlyIncreasing { account: NodeKey, index: usize },

    #[error("repair placeholder #{0} left unresolved at commit time")]
    UnresolvedRepairNode(u64),

    #[error("boundary proof failed to reconstruct root {expected}, got {computed}")]
    BoundaryProofFailed { expected: NodeKey, computed: NodeKey },

    #[error("node {0} referenced but not present in the trie database")]
    NodeNotFound(NodeKey),
}
