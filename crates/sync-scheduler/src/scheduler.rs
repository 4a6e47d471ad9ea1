use crate::buddy::Buddy;
use crate::ctrl::SchedulerCtrl;
use crate::errors::SchedulerError;
use crate::mode::BuddyMode;
use crate::stats::SchedulerStats;
use crate::work::BuddyWork;
use snap_net::PeerId;

/// The buddy-pool lifecycle: runs single-mode pivot negotiation, promotes
/// to multi-mode once negotiated, and can interrupt either with a pool-mode
/// barrier round. One `tick` is one cooperative pass over every buddy.
pub struct Scheduler<W: BuddyWork> {
    work: W,
    buddies: Vec<Buddy>,
    ctrl: SchedulerCtrl,
}

impl<W: BuddyWork> Scheduler<W> {
    pub fn new(work: W) -> Self {
        Self { work, buddies: Vec::new(), ctrl: SchedulerCtrl::default() }
    }

    pub fn add_peer(&mut self, peer: PeerId) {
        self.buddies.push(Buddy::new(peer));
    }

    pub fn remove_peer(&mut self, peer: PeerId) {
        self.buddies.retain(|b| b.peer != peer);
    }

    pub fn ctrl(&self) -> SchedulerCtrl {
        self.ctrl
    }

    pub fn stop(&mut self) {
        self.ctrl.stopped = true;
    }

    /// Request a pool-mode barrier round on the next tick.
    pub fn request_pool_mode(&mut self) {
        self.ctrl.pool_mode = true;
    }

    /// One cooperative pass. A stopped scheduler does nothing: the stop
    /// flag is checked before touching any buddy, matching the
    /// per-suspension-point cancellation rule the rest of the downloader
    /// follows.
    pub async fn tick(&mut self) -> Result<(), SchedulerError> {
        if self.ctrl.stopped {
            return Ok(());
        }

        if self.ctrl.pool_mode {
            return self.run_pool_round().await;
        }

        for buddy in self.buddies.clone() {
            if self.ctrl.stopped {
                break;
            }
            match buddy.mode {
                BuddyMode::Single => {
                    if self.work.run_single(buddy.peer).await? {
                        self.ctrl.multi_ok = true;
                    }
                }
                BuddyMode::Multi => {
                    self.work.run_multi(buddy.peer).await?;
                }
                BuddyMode::Pool => {}
            }
        }

        if self.ctrl.multi_ok {
            let promoted = self.buddies.iter().filter(|b| b.mode == BuddyMode::Single).count();
            if promoted > 0 {
                tracing::info!(promoted, "pivot negotiated, promoting single-mode buddies to multi");
            }
            for buddy in &mut self.buddies {
                if buddy.mode == BuddyMode::Single {
                    buddy.mode = BuddyMode::Multi;
                }
            }
        }

        Ok(())
    }

    async fn run_pool_round(&mut self) -> Result<(), SchedulerError> {
        tracing::trace!(buddies = self.buddies.len(), "running pool-mode barrier round");
        self.work.run_pool_hook().await?;
        self.ctrl.pool_mode = false;
        Ok(())
    }

    pub fn snapshot(&self, covered_accounts_factor: f64, active_pivot_number: u64) -> SchedulerStats {
        let mut stats =
            SchedulerStats { covered_accounts_factor, active_pivot_number, ..SchedulerStats::default() };
        for buddy in &self.buddies {
            match buddy.mode {
                BuddyMode::Single => stats.peers_single += 1,
                BuddyMode::Multi => stats.peers_multi += 1,
                BuddyMode::Pool => stats.peers_pool += 1,
            }
        }
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FakeWork {
        negotiate: bool,
        multi_calls: AtomicUsize,
        pool_calls: AtomicUsize,
    }

    #[async_trait::async_trait]
    impl BuddyWork for FakeWork {
        async fn run_single(&self, _peer: PeerId) -> Result<bool, SchedulerError> {
            Ok(self.negotiate)
        }
        async fn run_multi(&self, _peer: PeerId) -> Result<(), SchedulerError> {
            self.multi_calls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
        async fn run_pool_hook(&self) -> Result<(), SchedulerError> {
            self.pool_calls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    #[tokio::test]
    async fn negotiated_single_mode_promotes_to_multi() {
        let work = FakeWork { negotiate: true, multi_calls: AtomicUsize::new(0), pool_calls: AtomicUsize::new(0) };
        let mut scheduler = Scheduler::new(work);
        scheduler.add_peer(PeerId(1));
        scheduler.add_peer(PeerId(2));

        scheduler.tick().await.unwrap();
        assert!(scheduler.ctrl().multi_ok);
        assert!(scheduler.buddies.iter().all(|b| b.mode == BuddyMode::Multi));

        scheduler.tick().await.unwrap();
        assert_eq!(scheduler.work.multi_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn unnegotiated_single_mode_stays_single() {
        let work = FakeWork { negotiate: false, multi_calls: AtomicUsize::new(0), pool_calls: AtomicUsize::new(0) };
        let mut scheduler = Scheduler::new(work);
        scheduler.add_peer(PeerId(1));

        scheduler.tick().await.unwrap();
        assert!(!scheduler.ctrl().multi_ok);
        assert_eq!(scheduler.buddies[0].mode, BuddyMode::Single);
    }

    #[tokio::test]
    async fn pool_mode_runs_hook_once_then_clears() {
        let work = FakeWork { negotiate: true, multi_calls: AtomicUsize::new(0), pool_calls: AtomicUsize::new(0) };
        let mut scheduler = Scheduler::new(work);
        scheduler.add_peer(PeerId(1));
        scheduler.request_pool_mode();

        scheduler.tick().await.unwrap();
        assert_eq!(scheduler.work.pool_calls.load(Ordering::SeqCst), 1);
        assert!(!scheduler.ctrl().pool_mode);
        // Pool-mode round did not touch the buddy's own mode/work.
        assert_eq!(scheduler.work.multi_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn stopped_scheduler_does_nothing() {
        let work = FakeWork { negotiate: true, multi_calls: AtomicUsize::new(0), pool_calls: AtomicUsize::new(0) };
        let mut scheduler = Scheduler::new(work);
        scheduler.add_peer(PeerId(1));
        scheduler.stop();

        scheduler.tick().await.unwrap();
        assert!(!scheduler.ctrl().multi_ok);
        assert_eq!(scheduler.buddies[0].mode, BuddyMode::Single);
    }

    #[test]
    fn snapshot_counts_buddies_by_mode() {
        let work = FakeWork { negotiate: false, multi_calls: AtomicUsize::new(0), pool_calls: AtomicUsize::new(0) };
        let mut scheduler = Scheduler::new(work);
        scheduler.add_peer(PeerId(1));
        scheduler.add_peer(PeerId(2));
        scheduler.buddies[1].mode = BuddyMode::Multi;

        let stats = scheduler.snapshot(0.42, 17);
        assert_eq!(stats.peers_single, 1);
        assert_eq!(stats.peers_multi, 1);
        assert_eq!(stats.covered_accounts_factor, 0.42);
        assert_eq!(stats.active_pivot_number, 17);
    }
}
