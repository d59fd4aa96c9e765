//! TrialSweepScheduler - Runs the expiring-trials sweep on an interval.
//!
//! A failed run is logged and the next tick tries again. The first run
//! happens immediately on start.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time;

use super::{SweepExpiringTrialsCommand, SweepExpiringTrialsHandler, SweepReport};

pub struct TrialSweepScheduler {
    handler: Arc<SweepExpiringTrialsHandler>,
    interval: Duration,
}

impl TrialSweepScheduler {
    pub fn new(handler: Arc<SweepExpiringTrialsHandler>, interval: Duration) -> Self {
        Self { handler, interval }
    }

    /// Run until `shutdown` flips to `true`.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        let mut interval = time::interval(self.interval);
        interval.set_missed_tick_behavior(time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        tracing::info!("trial sweep scheduler stopped");
                        return;
                    }
                }

                _ = interval.tick() => {
                    self.run_once().await;
                }
            }
        }
    }

    /// One sweep; `None` when the run failed.
    pub async fn run_once(&self) -> Option<SweepReport> {
        match self.handler.handle(SweepExpiringTrialsCommand).await {
            Ok(report) => Some(report),
            Err(e) => {
                tracing::error!(error = %e, retryable = e.is_retryable(), "trial sweep failed");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::clock::FixedClock;
    use crate::adapters::events::InMemoryEventBus;
    use crate::adapters::memory::{InMemoryRecordStore, RecordingTrialNotifier};
    use crate::domain::foundation::EpochMillis;
    use serde_json::json;

    const NOW: EpochMillis = EpochMillis::new(1_705_276_800_000);

    fn scheduler(store: Arc<InMemoryRecordStore>, clock: Arc<FixedClock>, every: Duration) -> TrialSweepScheduler {
        let handler = SweepExpiringTrialsHandler::new(
            store,
            Arc::new(RecordingTrialNotifier::new()),
            Arc::new(InMemoryEventBus::new()),
            clock,
        );
        TrialSweepScheduler::new(Arc::new(handler), every)
    }

    #[tokio::test]
    async fn run_once_reports_or_swallows_failure() {
        let clock = Arc::new(FixedClock::new(NOW));
        let store = Arc::new(InMemoryRecordStore::new(clock.clone()));
        store.insert_raw_tenant("late", json!({"isInTrial": true, "trialEndDate": NOW.plus_days(-1).as_millis()}));
        let scheduler = scheduler(store.clone(), clock, Duration::from_secs(60));

        assert_eq!(scheduler.run_once().await.map(|r| r.expired), Some(1));

        store.set_unavailable(true);
        assert_eq!(scheduler.run_once().await, None);
    }

    #[tokio::test]
    async fn run_sweeps_until_shutdown() {
        let clock = Arc::new(FixedClock::new(NOW));
        let store = Arc::new(InMemoryRecordStore::new(clock.clone()));
        store.insert_raw_tenant("late", json!({"isInTrial": true, "trialEndDate": NOW.plus_days(-1).as_millis()}));
        let scheduler = scheduler(store.clone(), clock, Duration::from_millis(10));

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let handle = tokio::spawn(async move { scheduler.run(shutdown_rx).await });

        tokio::time::sleep(Duration::from_millis(50)).await;
        shutdown_tx.send(true).unwrap();
        handle.await.unwrap();

        assert_eq!(store.raw_tenant("late").unwrap()["status"], "inactive");
    }
}
