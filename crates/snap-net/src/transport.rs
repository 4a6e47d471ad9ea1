use crate::messages::{
    AccountRange, BlockHeaders, ByteCodes, GetAccountRange, GetBlockHeaders, GetByteCodes,
    GetStorageRanges, GetTrieNodes, Nodes, StorageRanges,
};
use async_trait::async_trait;
use thiserror::Error;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PeerId(pub u64);

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("peer {0:?} disconnected")]
    Disconnected(PeerId),
    #[error("peer {0:?} timed out")]
    Timeout(PeerId),
    #[error("peer {0:?} sent a malformed reply")]
    Malformed(PeerId),
}

/// The request surface the downloader and tracker program against. A real
/// implementation sits on top of a devp2p session and the snap/1 and
/// eth/66 wire codecs; tests substitute an in-memory fake.
#[async_trait]
pub trait PeerTransport: Send + Sync {
    async fn get_account_range(
        &self,
        peer: PeerId,
        req: GetAccountRange,
    ) -> Result<AccountRange, TransportError>;

    async fn get_storage_ranges(
        &self,
        peer: PeerId,
        req: GetStorageRanges,
    ) -> Result<StorageRanges, TransportError>;

    async fn get_byte_codes(
        &self,
        peer: PeerId,
        req: GetByteCodes,
    ) -> Result<ByteCodes, TransportError>;

    async fn get_trie_nodes(
        &self,
        peer: PeerId,
        req: GetTrieNodes,
    ) -> Result<Nodes, TransportError>;

    async fn get_block_headers(
        &self,
        peer: PeerId,
        req: GetBlockHeaders,
    ) -> Result<BlockHeaders, TransportError>;
}
