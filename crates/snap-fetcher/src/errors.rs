use range_desc::NodeKey;
use snap_net::TransportError;
use thiserror::Error;
use trie_db::TrieError;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error(transparent)]
    Trie(#[from] TrieError),
    #[error("byte code for hash {0:?} did not match its requested hash")]
    CodeHashMismatch(NodeKey),
}
