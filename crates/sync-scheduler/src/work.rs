use crate::errors::SchedulerError;
use async_trait::async_trait;
use snap_net::PeerId;

/// The actual work a buddy does in each mode, supplied by the caller so
/// this crate stays a pure lifecycle coordinator over the fetcher, tracker,
/// and healer crates rather than depending on all of them directly.
#[async_trait]
pub trait BuddyWork: Send + Sync {
    /// Negotiate a pivot with `peer`. Returns `true` once negotiation
    /// succeeds, which the scheduler takes as the `buddy.ctrl.multiOk`
    /// signal to promote every single-mode buddy to multi-mode.
    async fn run_single(&self, peer: PeerId) -> Result<bool, SchedulerError>;

    /// One round of ordinary range-fetch/heal work for `peer`.
    async fn run_multi(&self, peer: PeerId) -> Result<(), SchedulerError>;

    /// The global barrier hook run once while every buddy is parked in
    /// pool mode (e.g. resetting pivot envs at a coverage milestone).
    async fn run_pool_hook(&self) -> Result<(), SchedulerError>;
}
