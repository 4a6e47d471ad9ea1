//! Typed 32-byte node keys/tags, range pretty-printing, and node-spec
//! records shared by the interval-set, trie-db, and fetcher crates.

mod node_key;
mod node_spec;
mod node_tag;

pub use node_key::NodeKey;
pub use node_spec::{fmt_range, NodeSpec};
pub use node_tag::NodeTag;
