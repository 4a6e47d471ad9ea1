//! snap/1 and eth/66 message shapes consumed by the state downloader.
//!
//! The actual wire codec (RLP framing, devp2p transport, peer handshake) is
//! an external collaborator — this crate only fixes the message shapes and
//! the [`PeerTransport`] trait the rest of the downloader programs against,
//! so fetcher and tracker code can be written and tested without a real
//! network stack.

mod messages;
mod transport;

pub use messages::{
    AccountRange, BlockHeader, BlockHeaders, ByteCodes, GetAccountRange, GetBlockHeaders,
    GetByteCodes, GetStorageRanges, GetTrieNodes, HeaderQuery, Nodes, StorageRanges,
};
pub use transport::{PeerId, PeerTransport, TransportError};
