//! Per-peer canonical-head location.
//!
//! A tracker starts in `OnlyHash` (peer announced a hash but no number) or
//! `HuntForward` (peer announced a number) and narrows down to `Locked`,
//! the only mode in which `best_number`/`best_hash` are authoritative.

mod constants;
mod mode;
mod tracker;

pub use constants::{
    HUNT_BACKWARD_EXPAND_SHIFT, HUNT_FORWARD_EXPAND_SHIFT, HUNT_QUERY_SIZE, LOCKED_MIN_REPLY,
    LOCKED_QUERY_OVERLAP, LOCKED_QUERY_SIZE,
};
pub use mode::SyncMode;
pub use tracker::{HeadTrackerError, PeerHeadTracker, StepOutcome};
