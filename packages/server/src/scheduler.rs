//! Matching scheduler.
//!
//! Two independent triggers feed one serialized matching entry point: a
//! periodic tick and an on-demand wake-up fired after every successful join.
//! Both run through the same task (and the matching use case's own guard), so
//! concurrent cycles can never select the same queue entry. The task is
//! aborted on shutdown; every repository mutation inside a cycle is
//! all-or-nothing, so cancellation cannot leave the stores half-updated.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::usecase::RunMatchingCycleUseCase;

pub struct MatchingScheduler {
    matching_usecase: Arc<RunMatchingCycleUseCase>,
    trigger: Arc<Notify>,
    interval: Duration,
}

impl MatchingScheduler {
    /// Create a new scheduler.
    ///
    /// # Arguments
    ///
    /// * `matching_usecase` - the serialized matching entry point
    /// * `trigger` - on-demand wake-up shared with the join use case
    /// * `interval` - the periodic matching/eviction interval
    pub fn new(
        matching_usecase: Arc<RunMatchingCycleUseCase>,
        trigger: Arc<Notify>,
        interval: Duration,
    ) -> Self {
        Self {
            matching_usecase,
            trigger,
            interval,
        }
    }

    /// Spawn the scheduler loop. Abort the returned handle to stop it.
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(self.interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            tracing::info!(
                "Matching scheduler started (interval: {:?})",
                self.interval
            );
            loop {
                tokio::select! {
                    _ = ticker.tick() => {}
                    _ = self.trigger.notified() => {
                        tracing::debug!("Matching cycle triggered by join");
                    }
                }
                let report = self.matching_usecase.execute().await;
                if report.is_noop() {
                    tracing::trace!("Matching cycle: nothing to do");
                } else {
                    tracing::info!(
                        "Matching cycle: {} matched, {} evicted, {} conflicts, {} failed notifications",
                        report.matched_pairs,
                        report.evicted,
                        report.conflicts,
                        report.failed_notifications
                    );
                }
            }
        })
    }
}
