//! Storage-range fetch queueing: `storage_full` (accounts whose whole
//! storage trie still needs fetching) and `storage_part` (accounts with a
//! partial sub-range left from a truncated reply). Workers drain accounts
//! instead of storage while the full queue is short; once it backs up past
//! `storage_slots_qu_prio_thresh` they switch to draining storage first.

use crate::config::FetcherConfig;
use crate::errors::FetchError;
use crate::peer_health::PeerHealth;
use pivot_manager::PivotEnv;
use range_desc::NodeKey;
use snap_net::{GetStorageRanges, PeerId, PeerTransport, TransportError};
use std::time::Duration;
use trie_db::HexaryTrieDb;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NextWork {
    Accounts,
    Storage,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageFetchOutcome {
    /// Neither queue had an account to claim.
    NoWork,
    /// The account's whole storage trie was verified and imported.
    Completed(NodeKey),
    /// Only a prefix of the account's slots came back; the account was
    /// moved (or kept) in the partial queue for a follow-up round.
    Partial(NodeKey),
    /// A communication error was recorded; the account stays queued.
    Errored,
}

/// Which queue a worker should pull from next, per the
/// `STORAGE_SLOTS_QU_PRIO_THRESH` back-pressure rule.
pub fn next_work(env: &PivotEnv, config: &FetcherConfig) -> NextWork {
    if env.storage_full.len() > config.storage_slots_qu_prio_thresh {
        NextWork::Storage
    } else {
        NextWork::Accounts
    }
}

/// Enqueue an account discovered during an account-range fetch as needing
/// its whole storage trie fetched.
pub fn enqueue_storage_full(env: &mut PivotEnv, account: NodeKey) {
    env.storage_full.push(account);
}

/// Move an account from the full queue to the partial queue once a
/// storage-range reply for it comes back truncated.
pub fn demote_to_partial(env: &mut PivotEnv, account: NodeKey) {
    env.storage_full.retain(|a| *a != account);
    env.storage_part.push(account);
}

fn claim_account(env: &mut PivotEnv) -> Option<NodeKey> {
    if let Some(account) = env.storage_part.pop() {
        return Some(account);
    }
    env.storage_full.pop()
}

/// One claim/issue/verify/import cycle against a single account's storage
/// trie, mirroring [`crate::worker::run_account_fetch_round`] at the
/// per-account granularity `GetStorageRanges` works at. `storage_root` is
/// the account's storage root — decoding it out of the account's RLP value
/// is out of scope here, so the caller supplies it the same way
/// `run_account_fetch_round` is handed `pivot_root` rather than deriving it
/// itself.
pub async fn run_storage_fetch_round<T: PeerTransport>(
    transport: &T,
    peer: PeerId,
    pivot_root: NodeKey,
    storage_root: NodeKey,
    env: &mut PivotEnv,
    trie: &mut HexaryTrieDb,
    health: &mut PeerHealth,
    config: &FetcherConfig,
) -> Result<StorageFetchOutcome, FetchError> {
    let Some(account) = claim_account(env) else {
        return Ok(StorageFetchOutcome::NoWork);
    };

    let req = GetStorageRanges {
        root: pivot_root,
        accounts: vec![account],
        origin: NodeKey::ZERO,
        limit: NodeKey::MAX,
        bytes_budget: config.request_bytes_limit,
    };

    let reply = match transport.get_storage_ranges(peer, req).await {
        Ok(reply) => reply,
        Err(err) => {
            demote_to_partial(env, account);
            match err {
                TransportError::Timeout(_) => {
                    health.record_timeout();
                    tracing::trace!(?peer, %account, "storage range request timed out, keeping account queued");
                    tokio::time::sleep(Duration::from_millis(config.sleep_timeout_ms)).await;
                }
                TransportError::Disconnected(_) | TransportError::Malformed(_) => {
                    health.record_network();
                    tracing::trace!(?peer, %account, "storage range request failed, keeping account queued");
                    tokio::time::sleep(Duration::from_millis(config.sleep_network_ms)).await;
                }
            }
            return Ok(StorageFetchOutcome::Errored);
        }
    };

    let Some(slots) = reply.slots.into_iter().next() else {
        demote_to_partial(env, account);
        health.record_nodata();
        if config.sleep_nodata_ms > 0 {
            tokio::time::sleep(Duration::from_millis(config.sleep_nodata_ms)).await;
        }
        return Ok(StorageFetchOutcome::Errored);
    };

    if let Err(err) = trie.merge_proofs(storage_root, &reply.proofs) {
        demote_to_partial(env, account);
        health.record_network();
        return Err(err.into());
    }

    if let Err(err) = trie.interpolate_storage(account, storage_root, NodeKey::ZERO, &slots, false) {
        demote_to_partial(env, account);
        health.record_network();
        return Err(err.into());
    }
    env.imported_storage_slots += slots.len() as u64;
    health.record_success();

    if reply.proofs.is_empty() {
        env.storage_full.retain(|a| *a != account);
        env.storage_part.retain(|a| *a != account);
        tracing::trace!(?peer, %account, "storage trie fully covered");
        Ok(StorageFetchOutcome::Completed(account))
    } else {
        demote_to_partial(env, account);
        tracing::trace!(?peer, %account, "storage reply truncated, account stays queued");
        Ok(StorageFetchOutcome::Partial(account))
    }
}
