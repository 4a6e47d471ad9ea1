use crate::constants::{
    HUNT_BACKWARD_EXPAND_SHIFT, HUNT_FORWARD_EXPAND_SHIFT, HUNT_QUERY_SIZE, LOCKED_MIN_REPLY,
    LOCKED_QUERY_OVERLAP, LOCKED_QUERY_SIZE,
};
use crate::mode::SyncMode;
use range_desc::NodeKey;
use snap_net::{BlockHeader, GetBlockHeaders, HeaderQuery, PeerId, PeerTransport, TransportError};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HeadTrackerError {
    #[error(transparent)]
    Transport(#[from] TransportError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// A `GetBlockHeaders` was already in flight; this call slept 500ms and
    /// did nothing.
    Yielded,
    Advanced,
    Locked(u64),
}

/// A full-range exponential-search ceiling: once `step` would need to span
/// more of the number line than this many queries could plausibly cover, we
/// fall through to the quasi-binary `HuntRange` phase.
const FULL_RANGE_STEP_CEILING: u64 = u64::MAX / HUNT_QUERY_SIZE;

/// Per-peer state machine locating and then following a peer's canonical
/// head. `pending` is the `pendingGetBlockHeaders` gate: only one
/// `GetBlockHeaders` may be in flight per peer at a time.
#[derive(Debug)]
pub struct PeerHeadTracker {
    mode: SyncMode,
    pending: bool,
}

impl PeerHeadTracker {
    pub fn new_only_hash(hash: NodeKey) -> Self {
        Self { mode: SyncMode::OnlyHash { hash }, pending: false }
    }

    pub fn new_hunt_forward(from: u64) -> Self {
        Self {
            mode: SyncMode::HuntForward { low: from, high: from, step: HUNT_QUERY_SIZE },
            pending: false,
        }
    }

    pub fn mode(&self) -> SyncMode {
        self.mode
    }

    pub fn is_locked(&self) -> bool {
        matches!(self.mode, SyncMode::Locked { .. })
    }

    fn request(&self) -> GetBlockHeaders {
        match self.mode {
            SyncMode::Locked { best_number, .. } => GetBlockHeaders {
                start: HeaderQuery::Number(best_number.saturating_sub(LOCKED_QUERY_OVERLAP)),
                skip: 0,
                count: LOCKED_QUERY_SIZE,
                reverse: false,
            },
            SyncMode::OnlyHash { hash } => GetBlockHeaders {
                start: HeaderQuery::Hash(hash),
                skip: 0,
                count: LOCKED_QUERY_SIZE,
                reverse: false,
            },
            SyncMode::HuntForward { high, .. } => GetBlockHeaders {
                start: HeaderQuery::Number(high),
                skip: 0,
                count: HUNT_QUERY_SIZE,
                reverse: false,
            },
            SyncMode::HuntBackward { high, .. } => GetBlockHeaders {
                start: HeaderQuery::Number(high),
                skip: 0,
                count: HUNT_QUERY_SIZE,
                reverse: true,
            },
            SyncMode::HuntRange { low, high } => {
                let max_step = (high.saturating_sub(low).saturating_sub(1)) / HUNT_QUERY_SIZE;
                let mid = low + (high - low) / 2;
                GetBlockHeaders {
                    start: HeaderQuery::Number(mid),
                    skip: max_step.saturating_sub(1),
                    count: HUNT_QUERY_SIZE,
                    reverse: false,
                }
            }
            SyncMode::HuntRangeFinal { low, .. } => GetBlockHeaders {
                start: HeaderQuery::Number(low.saturating_sub(LOCKED_QUERY_OVERLAP)),
                skip: 0,
                count: LOCKED_QUERY_SIZE,
                reverse: false,
            },
        }
    }

    /// Issue one round-trip and advance the state machine. Yields instead
    /// of sending when a request is already in flight for this peer.
    pub async fn step<T: PeerTransport>(
        &mut self,
        transport: &T,
        peer: PeerId,
    ) -> Result<StepOutcome, HeadTrackerError> {
        if self.pending {
            tokio::time::sleep(Duration::from_millis(500)).await;
            return Ok(StepOutcome::Yielded);
        }

        let req = self.request();
        self.pending = true;
        let reply = transport.get_block_headers(peer, req).await;
        self.pending = false;
        let reply = reply?;

        self.apply(req, &reply.headers);
        Ok(match self.mode {
            SyncMode::Locked { best_number, .. } => StepOutcome::Locked(best_number),
            _ => StepOutcome::Advanced,
        })
    }

    fn apply(&mut self, req: GetBlockHeaders, headers: &[BlockHeader]) {
        self.mode = match self.mode {
            SyncMode::Locked { best_number, best_hash } => {
                self.apply_locked(req, headers, best_number, best_hash)
            }
            SyncMode::OnlyHash { .. } => self.apply_only_hash(headers),
            SyncMode::HuntForward { low, high, step } => {
                self.apply_hunt_forward(headers, low, high, step)
            }
            SyncMode::HuntBackward { low, high, step } => {
                self.apply_hunt_backward(headers, low, high, step)
            }
            SyncMode::HuntRange { low, high } => self.apply_hunt_range(headers, low, high),
            SyncMode::HuntRangeFinal { low, high } => {
                self.apply_hunt_range_final(headers, low, high)
            }
        };
    }

    fn apply_locked(
        &self,
        req: GetBlockHeaders,
        headers: &[BlockHeader],
        best_number: u64,
        best_hash: NodeKey,
    ) -> SyncMode {
        let req_start = match req.start {
            HeaderQuery::Number(n) => n,
            HeaderQuery::Hash(_) => best_number,
        };

        if headers.is_empty() {
            if req_start <= best_number {
                tracing::info!(peer_best = best_number, "reorg detected, hunting backward");
                return SyncMode::HuntBackward {
                    low: 0,
                    high: req_start,
                    step: HUNT_QUERY_SIZE << HUNT_BACKWARD_EXPAND_SHIFT,
                };
            }
            return SyncMode::Locked { best_number, best_hash };
        }

        if headers.len() < LOCKED_MIN_REPLY && is_contiguous(headers) {
            let last = headers.last().expect("non-empty");
            return SyncMode::Locked { best_number: last.number, best_hash: last.hash };
        }

        let last = headers.last().expect("non-empty");
        SyncMode::HuntForward { low: best_number, high: last.number, step: HUNT_QUERY_SIZE }
    }

    fn apply_only_hash(&self, headers: &[BlockHeader]) -> SyncMode {
        if headers.is_empty() {
            return SyncMode::HuntForward { low: 0, high: 0, step: HUNT_QUERY_SIZE };
        }
        let last = headers.last().expect("non-empty");
        SyncMode::Locked { best_number: last.number, best_hash: last.hash }
    }

    fn apply_hunt_forward(&self, headers: &[BlockHeader], low: u64, high: u64, step: u64) -> SyncMode {
        if headers.is_empty() {
            return SyncMode::HuntRange { low, high };
        }
        let new_low = headers.last().expect("non-empty").number;
        let new_step = step << HUNT_FORWARD_EXPAND_SHIFT;
        let new_high = new_low.saturating_add(new_step);
        if new_step >= FULL_RANGE_STEP_CEILING {
            return SyncMode::HuntRange { low: new_low, high: new_high };
        }
        SyncMode::HuntForward { low: new_low, high: new_high, step: new_step }
    }

    fn apply_hunt_backward(
        &self,
        headers: &[BlockHeader],
        low: u64,
        high: u64,
        step: u64,
    ) -> SyncMode {
        if headers.is_empty() {
            let new_low = high.saturating_sub(step);
            let new_step = step << HUNT_BACKWARD_EXPAND_SHIFT;
            if new_step >= FULL_RANGE_STEP_CEILING || new_low == 0 {
                return SyncMode::HuntRange { low: new_low, high };
            }
            return SyncMode::HuntBackward { low: new_low, high, step: new_step };
        }
        let found = headers.first().expect("non-empty").number;
        SyncMode::HuntRange { low: found, high }
    }

    fn apply_hunt_range(&self, headers: &[BlockHeader], low: u64, high: u64) -> SyncMode {
        let width = high.saturating_sub(low);
        if width < HUNT_QUERY_SIZE {
            return SyncMode::HuntRangeFinal { low, high };
        }
        match headers.last() {
            Some(last) if last.number < high => SyncMode::HuntRange { low: last.number, high },
            Some(_) => SyncMode::HuntRange { low, high: low + width / 2 },
            None => SyncMode::HuntRange { low, high: low + width / 2 },
        }
    }

    fn apply_hunt_range_final(&self, headers: &[BlockHeader], low: u64, high: u64) -> SyncMode {
        if headers.is_empty() {
            return SyncMode::HuntRangeFinal { low, high };
        }
        let last = headers.last().expect("non-empty");
        SyncMode::Locked { best_number: last.number, best_hash: last.hash }
    }
}

fn is_contiguous(headers: &[BlockHeader]) -> bool {
    headers.windows(2).all(|w| w[1].number == w[0].number + 1)
}
