//! In-memory hexary (Merkle-Patricia) trie storage: node import from wire
//! proofs, boundary-proof-seeded interpolation of known leaf ranges, and
//! dangling-child-reference inspection for the healing phase.

mod config;
mod db;
mod errors;
mod nibbles;
mod node;
mod path;
mod rlp;

pub use config::TrieDbConfig;
pub use db::{HexaryTrieDb, InspectOutcome};
pub use errors::TrieError;
pub use nibbles::Nibbles;
pub use node::{NodeRef, TrieNode, EMPTY_CODE_HASH, EMPTY_TRIE_ROOT};
pub use path::HexaryPath;
pub use rlp::keccak256;
