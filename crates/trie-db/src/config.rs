/// Tunables for trie inspection and import. Defaults match the
/// non-negotiable constants every deployment uses; tests override them to
/// exercise edge cases without building pathologically large tries.
#[derive(Clone, Copy, Debug)]
pub struct TrieDbConfig {
    /// When a direct inspection pass finds no dangling references, retry
    /// exploring down to this many nibbles of depth from the root before
    /// concluding the trie is complete. `None` disables the fallback pass.
    pub plan_b_level: Option<usize>,
    /// Nodes visited per inspection batch before yielding a cooperative
    /// suspension point back to the caller.
    pub heal_inspection_batch: usize,
    /// Whether `merge_proofs` keeps nodes that are present but unreachable
    /// from the claimed root ("free-standing" nodes).
    pub allow_free_standing: bool,
}

impl Default for TrieDbConfig {
    fn default() -> Self {
        Self { plan_b_level: Some(4), heal_inspection_batch: 10_000, allow_free_standing: false }
    }
}
