//! Trigger checks, inspect/enqueue batching, and dangling-node fetch+import
//! for the healing phase.

use crate::config::HealerConfig;
use crate::errors::HealError;
use crate::progress::HealTrigger;
use interval_set::IntervalSet;
use pivot_manager::{HealState, PivotEnv};
use range_desc::{NodeKey, NodeSpec};
use snap_net::{GetTrieNodes, PeerId, PeerTransport};
use std::collections::HashSet;
use trie_db::HexaryTrieDb;

/// Result of one inspect/fetch/import pass.
#[derive(Debug, Clone, Default)]
pub struct HealOutcome {
    pub enqueued: usize,
    pub imported: usize,
    pub dangling_remaining: usize,
    pub used_plan_b: bool,
}

/// Whether the account sweep has spent enough fetch work (including
/// redundant reorg refetches) to start healing, per `healAccountsTrigger`.
pub fn should_heal_accounts(trigger: &HealTrigger, config: &HealerConfig) -> bool {
    trigger.accounts_factor() > config.accounts_trigger
}

/// Whether a single account's storage trie is far enough along to start
/// healing its dangling references, per `healStorageSlotsTrigger`. Unlike
/// the accounts trigger this compares an ordinary (deduplicated) coverage
/// factor, since it is scoped to one account's own range set.
pub fn should_heal_storage(account_covered: &IntervalSet, config: &HealerConfig) -> bool {
    account_covered.full_factor() > config.storage_trigger
}

/// Inspect the pivot's account trie, seeded by whatever check-nodes are
/// already queued, fetch whatever came up dangling from `peer`, and import
/// the replies. Falls back to the full-trie plan-b scan automatically via
/// [`HexaryTrieDb::inspect`] when the direct pass turns up nothing.
pub async fn run_accounts_heal<T: PeerTransport>(
    transport: &T,
    peer: PeerId,
    trie: &mut HexaryTrieDb,
    root: NodeKey,
    env: &mut PivotEnv,
    config: &HealerConfig,
) -> Result<HealOutcome, HealError> {
    let (mut outcome, mut queue) =
        inspect_and_batch(trie, root, &env.fetch_accounts.missing_nodes, config.accounts_batch_max);
    outcome.imported = fetch_and_import(transport, peer, trie, root, &mut queue, config).await?;
    env.fetch_accounts.missing_nodes = queue;
    outcome.dangling_remaining = env.fetch_accounts.missing_nodes.len();
    env.healing = if env.fetch_accounts.missing_nodes.is_empty() { HealState::Done } else { HealState::Running };
    tracing::info!(
        root = %root,
        enqueued = outcome.enqueued,
        imported = outcome.imported,
        remaining = outcome.dangling_remaining,
        used_plan_b = outcome.used_plan_b,
        "accounts heal pass"
    );
    Ok(outcome)
}

/// Same inspect/fetch/import cycle as [`run_accounts_heal`], scoped to a
/// single account's storage trie. The caller owns the per-account
/// check-node queue since a `PivotEnv` only tracks storage trie membership
/// (`storage_full`/`storage_part`), not per-account inspection state.
pub async fn run_storage_heal<T: PeerTransport>(
    transport: &T,
    peer: PeerId,
    trie: &mut HexaryTrieDb,
    root: NodeKey,
    missing_nodes: &mut Vec<NodeSpec>,
    config: &HealerConfig,
) -> Result<HealOutcome, HealError> {
    let (mut outcome, mut queue) = inspect_and_batch(trie, root, missing_nodes, config.storage_batch_max);
    outcome.imported = fetch_and_import(transport, peer, trie, root, &mut queue, config).await?;
    *missing_nodes = queue;
    outcome.dangling_remaining = missing_nodes.len();
    tracing::trace!(
        root = %root,
        enqueued = outcome.enqueued,
        imported = outcome.imported,
        remaining = outcome.dangling_remaining,
        "storage heal pass"
    );
    Ok(outcome)
}

/// Request whatever is left in `queue` via `GetTrieNodes`, import every
/// node the peer returns, and drop the now-resolved entries from `queue`.
/// Returns how many nodes were imported; a peer that returns fewer nodes
/// than requested just leaves the rest queued for the next pass.
async fn fetch_and_import<T: PeerTransport>(
    transport: &T,
    peer: PeerId,
    trie: &mut HexaryTrieDb,
    root: NodeKey,
    queue: &mut Vec<NodeSpec>,
    config: &HealerConfig,
) -> Result<usize, HealError> {
    if queue.is_empty() {
        return Ok(0);
    }

    let paths: Vec<Vec<u8>> = queue.iter().map(|spec| spec.path.clone()).collect();
    let req = GetTrieNodes { root, paths, bytes_budget: config.request_bytes_limit };
    let reply = transport.get_trie_nodes(peer, req).await?;

    let mut seen = HashSet::new();
    let mut refs = HashSet::new();
    let mut imported = 0usize;
    for rlp in &reply.rlp_nodes {
        let hash = trie.import(rlp, &mut seen, &mut refs)?;
        queue.retain(|spec| spec.partial_key != Some(hash));
        imported += 1;
    }
    Ok(imported)
}

fn inspect_and_batch(
    trie: &HexaryTrieDb,
    root: NodeKey,
    seeds: &[NodeSpec],
    batch_max: usize,
) -> (HealOutcome, Vec<NodeSpec>) {
    let raw = trie.inspect(root, seeds);
    let enqueued = raw.dangling.len().min(batch_max);
    let outcome = HealOutcome {
        enqueued,
        imported: 0,
        dangling_remaining: raw.dangling.len().saturating_sub(enqueued),
        used_plan_b: raw.used_plan_b,
    };
    let queue = raw.dangling.into_iter().take(batch_max).collect();
    (outcome, queue)
}
