//! Request/response pairs for the four snap/1 range-fetching calls plus the
//! one eth/66 call the tracker needs (`GetBlockHeaders`). Field shapes
//! follow the wire spec exactly; this module does not encode or decode
//! them — that's the codec's job, out of scope here.

use range_desc::NodeKey;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetAccountRange {
    pub root: NodeKey,
    pub origin: NodeKey,
    pub limit: NodeKey,
    pub bytes_budget: u64,
}

/// `accounts` sorted by hash ascending, every hash `>= origin`; the last
/// hash is `<= limit` unless the reply was truncated to `bytes_budget`.
/// `proofs` prove the first and last returned accounts against `root`.
#[derive(Clone, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AccountRange {
    pub accounts: Vec<(NodeKey, Vec<u8>)>,
    pub proofs: Vec<Vec<u8>>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetStorageRanges {
    pub root: NodeKey,
    pub accounts: Vec<NodeKey>,
    pub origin: NodeKey,
    pub limit: NodeKey,
    pub bytes_budget: u64,
}

/// One slot list per requested account, each sorted by slot hash ascending.
/// Only the last account's slot list may be partial; if so `proofs` proves
/// its first and last returned slots.
#[derive(Clone, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StorageRanges {
    pub slots: Vec<Vec<(NodeKey, Vec<u8>)>>,
    pub proofs: Vec<Vec<u8>>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetByteCodes {
    pub hashes: Vec<NodeKey>,
    pub bytes_budget: u64,
}

#[derive(Clone, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ByteCodes {
    pub code: Vec<Vec<u8>>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetTrieNodes {
    pub root: NodeKey,
    pub paths: Vec<Vec<u8>>,
    pub bytes_budget: u64,
}

#[derive(Clone, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Nodes {
    pub rlp_nodes: Vec<Vec<u8>>,
}

/// Either a block hash or a block number; `GetBlockHeaders` may start from
/// either anchor.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum HeaderQuery {
    Hash(NodeKey),
    Number(u64),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetBlockHeaders {
    pub start: HeaderQuery,
    pub skip: u64,
    pub count: u64,
    pub reverse: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockHeader {
    pub number: u64,
    pub hash: NodeKey,
    pub state_root: NodeKey,
}

#[derive(Clone, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BlockHeaders {
    pub headers: Vec<BlockHeader>,
}
