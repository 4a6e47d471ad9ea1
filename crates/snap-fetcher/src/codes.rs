//! Contract bytecode fetch queueing. Accounts with a non-empty code hash
//! are enqueued here by whatever decodes account values (out of scope for
//! this crate — callers push hashes the same way [`crate::storage`] callers
//! push accounts onto the storage queues); a worker drains the queue in
//! batches against `GetByteCodes`.

use crate::config::FetcherConfig;
use crate::errors::FetchError;
use crate::peer_health::PeerHealth;
use pivot_manager::PivotEnv;
use range_desc::NodeKey;
use snap_net::{GetByteCodes, PeerId, PeerTransport, TransportError};
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodeFetchOutcome {
    /// The queue had nothing to claim.
    NoWork,
    /// `usize` bytecodes were verified against their requested hash and
    /// imported; any unanswered hashes were returned to the queue.
    Imported(usize),
    /// A communication error was recorded; the claimed batch was returned.
    Errored,
}

/// Enqueue a code hash discovered on a fetched account. The empty-code
/// hash (an externally-owned account, or a contract with no code) is never
/// worth a round trip and is silently dropped.
pub fn enqueue_code_hash(env: &mut PivotEnv, hash: NodeKey) {
    if hash == trie_db::EMPTY_CODE_HASH {
        return;
    }
    env.code_hashes.push(hash);
}

fn claim_batch(env: &mut PivotEnv, max: usize) -> Vec<NodeKey> {
    let take = max.min(env.code_hashes.len());
    env.code_hashes.split_off(env.code_hashes.len() - take)
}

/// One claim/issue/verify/import cycle against the code-hash queue.
pub async fn run_code_fetch_round<T: PeerTransport>(
    transport: &T,
    peer: PeerId,
    env: &mut PivotEnv,
    health: &mut PeerHealth,
    config: &FetcherConfig,
) -> Result<CodeFetchOutcome, FetchError> {
    let hashes = claim_batch(env, config.code_batch_max);
    if hashes.is_empty() {
        return Ok(CodeFetchOutcome::NoWork);
    }

    let req = GetByteCodes { hashes: hashes.clone(), bytes_budget: config.request_bytes_limit };

    let reply = match transport.get_byte_codes(peer, req).await {
        Ok(reply) => reply,
        Err(err) => {
            env.code_hashes.extend(hashes);
            match err {
                TransportError::Timeout(_) => {
                    health.record_timeout();
                    tracing::trace!(?peer, "byte codes request timed out, returning batch");
                    tokio::time::sleep(Duration::from_millis(config.sleep_timeout_ms)).await;
                }
                TransportError::Disconnected(_) | TransportError::Malformed(_) => {
                    health.record_network();
                    tracing::trace!(?peer, "byte codes request failed, returning batch");
                    tokio::time::sleep(Duration::from_millis(config.sleep_network_ms)).await;
                }
            }
            return Ok(CodeFetchOutcome::Errored);
        }
    };

    if reply.code.is_empty() {
        env.code_hashes.extend(hashes);
        health.record_nodata();
        if config.sleep_nodata_ms > 0 {
            tokio::time::sleep(Duration::from_millis(config.sleep_nodata_ms)).await;
        }
        return Ok(CodeFetchOutcome::Errored);
    }

    let mut imported = 0usize;
    for (hash, code) in hashes.iter().zip(reply.code.into_iter()) {
        if trie_db::keccak256(&code) != *hash {
            return Err(FetchError::CodeHashMismatch(*hash));
        }
        env.code.insert(*hash, code);
        env.imported_code += 1;
        imported += 1;
    }
    if imported < hashes.len() {
        env.code_hashes.extend(hashes.into_iter().skip(imported));
    }
    health.record_success();
    tracing::trace!(?peer, imported, "byte codes imported");
    Ok(CodeFetchOutcome::Imported(imported))
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use pivot_manager::StateHeader;
    use snap_net::{
        AccountRange, BlockHeaders, GetAccountRange, GetBlockHeaders, GetStorageRanges,
        GetTrieNodes, Nodes, StorageRanges,
    };

    fn env() -> PivotEnv {
        PivotEnv::new(StateHeader { number: 0, hash: NodeKey::ZERO, state_root: NodeKey::ZERO })
    }

    struct FixedCodesPeer {
        reply: std::sync::Mutex<Option<snap_net::ByteCodes>>,
    }

    #[async_trait]
    impl PeerTransport for FixedCodesPeer {
        async fn get_account_range(
            &self,
            _peer: PeerId,
            _req: GetAccountRange,
        ) -> Result<AccountRange, TransportError> {
            unimplemented!()
        }
        async fn get_storage_ranges(
            &self,
            _peer: PeerId,
            _req: GetStorageRanges,
        ) -> Result<StorageRanges, TransportError> {
            unimplemented!()
        }
        async fn get_byte_codes(
            &self,
            _peer: PeerId,
            _req: GetByteCodes,
        ) -> Result<snap_net::ByteCodes, TransportError> {
            Ok(self.reply.lock().unwrap().take().unwrap_or_default())
        }
        async fn get_trie_nodes(
            &self,
            _peer: PeerId,
            _req: GetTrieNodes,
        ) -> Result<Nodes, TransportError> {
            unimplemented!()
        }
        async fn get_block_headers(
            &self,
            _peer: PeerId,
            _req: GetBlockHeaders,
        ) -> Result<BlockHeaders, TransportError> {
            unimplemented!()
        }
    }

    #[tokio::test]
    async fn no_work_when_queue_empty() {
        let mut e = env();
        let peer = FixedCodesPeer { reply: std::sync::Mutex::new(None) };
        let mut health = PeerHealth::default();
        let config = FetcherConfig::default();

        let outcome = run_code_fetch_round(&peer, PeerId(1), &mut e, &mut health, &config).await.unwrap();
        assert_eq!(outcome, CodeFetchOutcome::NoWork);
    }

    #[tokio::test]
    async fn empty_code_hash_is_never_enqueued() {
        let mut e = env();
        enqueue_code_hash(&mut e, trie_db::EMPTY_CODE_HASH);
        assert!(e.code_hashes.is_empty());
    }

    #[tokio::test]
    async fn matching_reply_imports_and_verifies_hash() {
        let code = vec![0x60u8, 0x00, 0x60, 0x00];
        let hash = trie_db::keccak256(&code);

        let mut e = env();
        enqueue_code_hash(&mut e, hash);

        let reply = snap_net::ByteCodes { code: vec![code.clone()] };
        let peer = FixedCodesPeer { reply: std::sync::Mutex::new(Some(reply)) };
        let mut health = PeerHealth::default();
        let config = FetcherConfig::default();

        let outcome = run_code_fetch_round(&peer, PeerId(1), &mut e, &mut health, &config).await.unwrap();
        assert_eq!(outcome, CodeFetchOutcome::Imported(1));
        assert_eq!(e.code.get(&hash), Some(&code));
        assert_eq!(e.imported_code, 1);
        assert!(e.code_hashes.is_empty());
    }

    #[tokio::test]
    async fn mismatched_hash_is_rejected() {
        let code = vec![1u8, 2, 3];
        let wrong_hash = NodeKey::new([9; 32]);

        let mut e = env();
        enqueue_code_hash(&mut e, wrong_hash);

        let reply = snap_net::ByteCodes { code: vec![code] };
        let peer = FixedCodesPeer { reply: std::sync::Mutex::new(Some(reply)) };
        let mut health = PeerHealth::default();
        let config = FetcherConfig::default();

        let err = run_code_fetch_round(&peer, PeerId(1), &mut e, &mut health, &config).await.unwrap_err();
        assert!(matches!(err, FetchError::CodeHashMismatch(h) if h == wrong_hash));
    }
}
