use snap_net::TransportError;
use thiserror::Error;
use trie_db::TrieError;

#[derive(Debug, Error)]
pub enum HealError {
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error(transparent)]
    Trie(#[from] TrieError),
}
