//! The per-peer account-range fetch round: claim, request, verify, import,
//! release. One call to [`run_account_fetch_round`] is one slice; the
//! scheduler calls it in a loop for as long as there is work and the peer
//! is alive.

use crate::config::FetcherConfig;
use crate::errors::FetchError;
use crate::peer_health::PeerHealth;
use healer::HealTrigger;
use interval_set::{Interval, IntervalSet};
use pivot_manager::PivotEnv;
use range_desc::NodeTag;
use snap_net::{GetAccountRange, PeerId, PeerTransport, TransportError};
use std::time::Duration;
use trie_db::HexaryTrieDb;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    /// Nothing left to claim this round.
    NoWork,
    /// The whole claimed slice was covered.
    Covered(Interval),
    /// Only a prefix of the claimed slice came back; the remainder was
    /// returned to the pivot's secondary set.
    Partial { covered: Interval, returned: Interval },
    /// A communication error was recorded; the claimed slice (if any) was
    /// returned to the pivot's primary set.
    Errored,
}

/// One claim/issue/verify/import/release cycle against an account range.
pub async fn run_account_fetch_round<T: PeerTransport>(
    transport: &T,
    peer: PeerId,
    pivot_root: range_desc::NodeKey,
    env: &mut PivotEnv,
    trie: &mut HexaryTrieDb,
    health: &mut PeerHealth,
    config: &FetcherConfig,
    global_covered: &mut IntervalSet,
    trigger: &mut HealTrigger,
) -> Result<FetchOutcome, FetchError> {
    env.fetch_accounts.swap_if_primary_empty();
    let Some(iv) = env.fetch_accounts.primary.claim_bounded(config.max_fetch_range) else {
        return Ok(FetchOutcome::NoWork);
    };

    let req = GetAccountRange {
        root: pivot_root,
        origin: iv.lo.to_key(),
        limit: iv.hi.to_key(),
        bytes_budget: config.request_bytes_limit,
    };

    let reply = match transport.get_account_range(peer, req).await {
        Ok(reply) => reply,
        Err(err) => {
            env.fetch_accounts.primary.merge_interval(iv);
            match err {
                TransportError::Timeout(_) => {
                    health.record_timeout();
                    tracing::trace!(?peer, "account range request timed out, returning slice");
                    tokio::time::sleep(Duration::from_millis(config.sleep_timeout_ms)).await;
                }
                TransportError::Disconnected(_) | TransportError::Malformed(_) => {
                    health.record_network();
                    tracing::trace!(?peer, "account range request failed, returning slice");
                    tokio::time::sleep(Duration::from_millis(config.sleep_network_ms)).await;
                }
            }
            return Ok(FetchOutcome::Errored);
        }
    };

    if reply.accounts.is_empty() {
        env.fetch_accounts.primary.merge_interval(iv);
        health.record_nodata();
        if config.sleep_nodata_ms > 0 {
            tokio::time::sleep(Duration::from_millis(config.sleep_nodata_ms)).await;
        }
        return Ok(FetchOutcome::Errored);
    }

    // A pivot's very first slice starts from whatever the trie was left
    // holding by a previously evicted pivot; discard it so this pivot's
    // root verification can't be satisfied by leftover stale nodes.
    if env.imported_accounts == 0 {
        trie.reset();
    }

    if let Err(err) = trie.merge_proofs(pivot_root, &reply.proofs) {
        env.fetch_accounts.primary.merge_interval(iv);
        health.record_network();
        return Err(err.into());
    }

    if let Err(err) = trie.interpolate(pivot_root, iv.lo.to_key(), &reply.accounts, false) {
        env.fetch_accounts.primary.merge_interval(iv);
        health.record_network();
        return Err(err.into());
    }
    env.imported_accounts += reply.accounts.len() as u64;

    let last_hash = reply.accounts.last().expect("checked non-empty above").0;
    let last_tag = NodeTag::from(last_hash);
    health.record_success();

    if last_tag >= iv.hi {
        let covered = Interval::new(iv.lo, iv.hi);
        env.mark_covered(covered);
        global_covered.merge_interval(covered);
        trigger.record(covered.span());
        tracing::trace!(?peer, lo = %covered.lo, hi = %covered.hi, "account slice fully covered");
        Ok(FetchOutcome::Covered(covered))
    } else {
        let covered = Interval::new(iv.lo, last_tag);
        env.mark_covered(covered);
        global_covered.merge_interval(covered);
        trigger.record(covered.span());
        let returned = Interval::new(last_tag.saturating_succ(), iv.hi);
        env.fetch_accounts.secondary.merge_interval(returned);
        tracing::trace!(?peer, lo = %returned.lo, hi = %returned.hi, "reply truncated, returning remainder to secondary");
        Ok(FetchOutcome::Partial { covered, returned })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use pivot_manager::StateHeader;
    use range_desc::NodeKey;
    use snap_net::{
        AccountRange, BlockHeaders, ByteCodes, GetBlockHeaders, GetByteCodes, GetStorageRanges,
        GetTrieNodes, Nodes, StorageRanges,
    };
    use trie_db::TrieDbConfig;

    struct FixedReplyPeer {
        reply: std::sync::Mutex<Option<AccountRange>>,
        err: Option<TransportError>,
    }

    #[async_trait]
    impl PeerTransport for FixedReplyPeer {
        async fn get_account_range(
            &self,
            _peer: PeerId,
            _req: GetAccountRange,
        ) -> Result<AccountRange, TransportError> {
            if let Some(err) = &self.err {
                return Err(clone_err(err));
            }
            Ok(self.reply.lock().unwrap().take().unwrap_or_default())
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
        ) -> Result<ByteCodes, TransportError> {
            unimplemented!()
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

    fn clone_err(err: &TransportError) -> TransportError {
        match err {
            TransportError::Disconnected(p) => TransportError::Disconnected(*p),
            TransportError::Timeout(p) => TransportError::Timeout(*p),
            TransportError::Malformed(p) => TransportError::Malformed(*p),
        }
    }

    fn leaf(b: u8) -> (NodeKey, Vec<u8>) {
        (NodeKey::new([b; 32]), vec![b])
    }

    #[tokio::test]
    async fn nodata_reply_returns_slice_and_records_error() {
        let peer = FixedReplyPeer { reply: std::sync::Mutex::new(Some(AccountRange::default())), err: None };
        let mut env = PivotEnv::new(StateHeader { number: 0, hash: NodeKey::ZERO, state_root: NodeKey::ZERO });
        let mut trie = HexaryTrieDb::new(TrieDbConfig::default());
        let mut health = PeerHealth::default();
        let config = FetcherConfig::default();
        let mut global = IntervalSet::new();
        let mut trigger = HealTrigger::new();

        let outcome = run_account_fetch_round(
            &peer,
            PeerId(1),
            NodeKey::ZERO,
            &mut env,
            &mut trie,
            &mut health,
            &config,
            &mut global,
            &mut trigger,
        )
        .await
        .unwrap();

        assert_eq!(outcome, FetchOutcome::Errored);
        assert_eq!(health.nodata_errors, 1);
        assert!(!env.fetch_accounts.primary.is_empty());
    }

    #[tokio::test]
    async fn timeout_error_returns_slice_and_records_error() {
        let peer = FixedReplyPeer { reply: std::sync::Mutex::new(None), err: Some(TransportError::Timeout(PeerId(1))) };
        let mut env = PivotEnv::new(StateHeader { number: 0, hash: NodeKey::ZERO, state_root: NodeKey::ZERO });
        let mut trie = HexaryTrieDb::new(TrieDbConfig::default());
        let mut health = PeerHealth::default();
        let mut config = FetcherConfig::default();
        config.sleep_timeout_ms = 0;
        let mut global = IntervalSet::new();
        let mut trigger = HealTrigger::new();

        let outcome = run_account_fetch_round(
            &peer,
            PeerId(1),
            NodeKey::ZERO,
            &mut env,
            &mut trie,
            &mut health,
            &config,
            &mut global,
            &mut trigger,
        )
        .await
        .unwrap();

        assert_eq!(outcome, FetchOutcome::Errored);
        assert_eq!(health.timeout_errors, 1);
    }

    #[tokio::test]
    async fn full_coverage_reply_marks_whole_slice_covered() {
        use trie_db::TrieNode;
        let leaf_node = leaf(1);
        let node = TrieNode::Leaf {
            path: trie_db::Nibbles::from_key(leaf_node.0),
            value: leaf_node.1.clone(),
        };
        let root = node.hash();
        let proof = node.rlp_encode();

        let mut env = PivotEnv::new(StateHeader { number: 0, hash: NodeKey::ZERO, state_root: root });
        env.fetch_accounts.primary = IntervalSet::new();
        env.fetch_accounts.primary.merge_interval(Interval::new(NodeTag::from(leaf_node.0), NodeTag::from(leaf_node.0)));

        let reply = AccountRange { accounts: vec![leaf_node], proofs: vec![proof] };
        let peer = FixedReplyPeer { reply: std::sync::Mutex::new(Some(reply)), err: None };
        let mut trie = HexaryTrieDb::new(TrieDbConfig::default());
        let mut health = PeerHealth::default();
        let config = FetcherConfig::default();
        let mut global = IntervalSet::new();
        let mut trigger = HealTrigger::new();

        let outcome = run_account_fetch_round(
            &peer,
            PeerId(1),
            root,
            &mut env,
            &mut trie,
            &mut health,
            &config,
            &mut global,
            &mut trigger,
        )
        .await
        .unwrap();

        assert!(matches!(outcome, FetchOutcome::Covered(_)));
        assert!(env.fetch_accounts.primary.is_empty());
        assert!(!global.is_empty());
        assert!(trigger.cumulative_covered() > primitive_types::U256::zero());
        assert!(trie.contains(&root));
        assert_eq!(trie.get(&root), Some(&node));
        assert_eq!(env.imported_accounts, 1);
    }
}
