use crate::range_batch::RangeBatch;
use interval_set::IntervalSet;
use range_desc::NodeKey;

/// Healing proceeds once, after an account sweep completes: `Idle` before
/// it has been triggered, `Running` while the inspect/fetch loop is active,
/// `Done` once a pass finds nothing dangling.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HealState {
    Idle,
    Running,
    Done,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StateHeader {
    pub number: u64,
    pub hash: NodeKey,
    pub state_root: NodeKey,
}

/// Everything scoped to one pivot attempt: which accounts ranges remain,
/// which storage tries still need fetching, and how far healing has
/// progressed. Dropped when evicted from the pivot LRU.
#[derive(Debug, Clone)]
pub struct PivotEnv {
    pub header: StateHeader,
    pub fetch_accounts: RangeBatch,
    /// Ranges of the account-hash space verified and imported for this
    /// pivot specifically (folded into the process-wide covered-accounts
    /// union when this pivot is replaced).
    pub covered: IntervalSet,
    pub storage_full: Vec<NodeKey>,
    pub storage_part: Vec<NodeKey>,
    /// Code hashes discovered on fetched accounts, still needing their
    /// bytecode downloaded.
    pub code_hashes: Vec<NodeKey>,
    /// Bytecode verified against its Keccak hash and imported so far.
    pub code: std::collections::HashMap<NodeKey, Vec<u8>>,
    pub healing: HealState,
    pub imported_accounts: u64,
    pub imported_storage_slots: u64,
    pub imported_code: u64,
}

impl PivotEnv {
    pub fn new(header: StateHeader) -> Self {
        Self {
            header,
            fetch_accounts: RangeBatch::full(),
            covered: IntervalSet::new(),
            storage_full: Vec::new(),
            storage_part: Vec::new(),
            code_hashes: Vec::new(),
            code: std::collections::HashMap::new(),
            healing: HealState::Idle,
            imported_accounts: 0,
            imported_storage_slots: 0,
            imported_code: 0,
        }
    }

    /// Record that `[lo, hi]` of the account-hash space was verified and
    /// imported: remove it from both fetch-accounts sets, union it into
    /// this pivot's covered range.
    pub fn mark_covered(&mut self, iv: interval_set::Interval) {
        self.fetch_accounts.primary.reduce_interval(iv);
        self.fetch_accounts.secondary.reduce_interval(iv);
        self.covered.merge_interval(iv);
    }

    pub fn is_accounts_complete(&self) -> bool {
        self.fetch_accounts.primary.is_empty() && self.fetch_accounts.secondary.is_empty()
    }
}
