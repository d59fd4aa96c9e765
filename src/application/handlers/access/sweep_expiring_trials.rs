//! SweepExpiringTrialsHandler - Batch pass over every tenant in trial.
//!
//! For each tenant with `isInTrial=true` and a recorded end:
//! - ended before now: deactivated (`isInTrial=false`, `status=inactive`,
//!   `trialExpiredAt=now`) and an expired notice is raised;
//! - ending within the final window: final notice;
//! - ending within the closing-soon window: closing-soon notice.
//!
//! Windows are re-evaluated on every run. Avoiding duplicate notices is the
//! notifier's job. A failure on one tenant is logged and counted; the sweep
//! moves on. Only failing to list the tenants aborts the run.

use std::sync::Arc;

use crate::domain::access::{
    AccessError, NoticeWindows, Tenant, TenantPatch, TrialExpired, TrialNotice, TrialNoticeKind,
};
use crate::domain::foundation::{DomainError, EpochMillis, EventId, SerializableDomainEvent};
use crate::ports::{Clock, EventPublisher, TenantRepository, TrialNotifier};

use super::publish_audit;

#[derive(Debug, Clone, Default)]
pub struct SweepExpiringTrialsCommand;

/// Counts for one sweep run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub examined: usize,
    pub expired: usize,
    pub closing_soon: usize,
    pub final_notices: usize,
    pub failures: usize,
}

pub struct SweepExpiringTrialsHandler {
    tenants: Arc<dyn TenantRepository>,
    notifier: Arc<dyn TrialNotifier>,
    event_publisher: Arc<dyn EventPublisher>,
    clock: Arc<dyn Clock>,
    windows: NoticeWindows,
}

impl SweepExpiringTrialsHandler {
    pub fn new(
        tenants: Arc<dyn TenantRepository>,
        notifier: Arc<dyn TrialNotifier>,
        event_publisher: Arc<dyn EventPublisher>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            tenants,
            notifier,
            event_publisher,
            clock,
            windows: NoticeWindows::default(),
        }
    }

    pub fn with_windows(mut self, windows: NoticeWindows) -> Self {
        self.windows = windows;
        self
    }

    pub async fn handle(&self, _cmd: SweepExpiringTrialsCommand) -> Result<SweepReport, AccessError> {
        let now = self.clock.now();
        let run_id = format!("trial-sweep-{}", now.as_millis());
        let tenants = self.tenants.list_in_trial().await?;
        let mut report = SweepReport::default();

        for tenant in tenants {
            report.examined += 1;
            let Some(end) = tenant.trial_end_date else {
                continue;
            };
            let Some(kind) = self.windows.classify(end, now) else {
                continue;
            };

            match self.process(&tenant, kind, end, now, &run_id).await {
                Ok(()) => match kind {
                    TrialNoticeKind::Expired => report.expired += 1,
                    TrialNoticeKind::Final => report.final_notices += 1,
                    TrialNoticeKind::ClosingSoon => report.closing_soon += 1,
                },
                Err(e) => {
                    report.failures += 1;
                    tracing::warn!(tenant_id = %tenant.id, kind = ?kind, error = %e, "trial sweep failed for tenant");
                }
            }
        }

        tracing::info!(
            examined = report.examined,
            expired = report.expired,
            closing_soon = report.closing_soon,
            final_notices = report.final_notices,
            failures = report.failures,
            "trial sweep finished"
        );
        Ok(report)
    }

    async fn process(
        &self,
        tenant: &Tenant,
        kind: TrialNoticeKind,
        end: EpochMillis,
        now: EpochMillis,
        run_id: &str,
    ) -> Result<(), DomainError> {
        if kind == TrialNoticeKind::Expired {
            let applied = self
                .tenants
                .apply_patch(&tenant.id, &TenantPatch::trial_lapsed(now))
                .await?;
            if !applied {
                return Ok(());
            }
            tracing::info!(tenant_id = %tenant.id, trial_end_date = %end, "trial expired, tenant deactivated");

            let event = TrialExpired {
                event_id: EventId::new(),
                tenant_id: tenant.id.clone(),
                trial_end_date: end,
                occurred_at: now,
            };
            publish_audit(self.event_publisher.as_ref(), event.to_envelope().with_correlation_id(run_id)).await;
        }

        let notice = TrialNotice::new(tenant.id.clone(), kind, end, now, tenant.email.clone());
        if !self.notifier.notify(&notice).await? {
            tracing::debug!(tenant_id = %tenant.id, kind = ?kind, "notice already delivered");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::clock::FixedClock;
    use crate::adapters::events::InMemoryEventBus;
    use crate::adapters::memory::{InMemoryRecordStore, RecordingTrialNotifier};
    use crate::domain::foundation::{ErrorCode, TenantId, MILLIS_PER_HOUR};
    use async_trait::async_trait;
    use serde_json::json;

    const NOW: EpochMillis = EpochMillis::new(1_705_276_800_000);

    struct Fixture {
        store: Arc<InMemoryRecordStore>,
        notifier: Arc<RecordingTrialNotifier>,
        bus: Arc<InMemoryEventBus>,
        handler: SweepExpiringTrialsHandler,
    }

    fn fixture() -> Fixture {
        let clock = Arc::new(FixedClock::new(NOW));
        let store = Arc::new(InMemoryRecordStore::new(clock.clone()));
        let notifier = Arc::new(RecordingTrialNotifier::new());
        let bus = Arc::new(InMemoryEventBus::new());
        let handler = SweepExpiringTrialsHandler::new(store.clone(), notifier.clone(), bus.clone(), clock);
        Fixture {
            store,
            notifier,
            bus,
            handler,
        }
    }

    fn seed(store: &InMemoryRecordStore, id: &str, end: EpochMillis) {
        store.insert_raw_tenant(id, json!({"isInTrial": true, "trialEndDate": end.as_millis()}));
    }

    fn id(raw: &str) -> TenantId {
        TenantId::new(raw).unwrap()
    }

    #[tokio::test]
    async fn expired_trial_is_deactivated_and_stamped() {
        let f = fixture();
        seed(&f.store, "late", NOW.plus_millis(-1));

        let report = f.handler.handle(SweepExpiringTrialsCommand).await.unwrap();

        assert_eq!(report.expired, 1);
        let raw = f.store.raw_tenant("late").unwrap();
        assert_eq!(raw["isInTrial"], false);
        assert_eq!(raw["status"], "inactive");
        assert_eq!(raw["trialExpiredAt"], NOW.as_millis());
        assert_eq!(f.notifier.delivered_to(&id("late")), vec![TrialNoticeKind::Expired]);
        let events = f.bus.events_of_type("tenant.trial_expired.v1");
        assert_eq!(events.len(), 1);
        assert_eq!(
            events[0].metadata.correlation_id,
            Some(format!("trial-sweep-{}", NOW.as_millis()))
        );
    }

    #[tokio::test]
    async fn notices_follow_windows() {
        let f = fixture();
        seed(&f.store, "final", NOW.plus_millis(12 * MILLIS_PER_HOUR));
        seed(&f.store, "soon", NOW.plus_days(2));
        seed(&f.store, "far", NOW.plus_days(10));
        f.store.insert_raw_tenant("open", json!({"isInTrial": true}));

        let report = f.handler.handle(SweepExpiringTrialsCommand).await.unwrap();

        assert_eq!(report.examined, 4);
        assert_eq!(report.final_notices, 1);
        assert_eq!(report.closing_soon, 1);
        assert_eq!(f.notifier.delivered_to(&id("final")), vec![TrialNoticeKind::Final]);
        assert_eq!(f.notifier.delivered_to(&id("soon")), vec![TrialNoticeKind::ClosingSoon]);
        assert!(f.notifier.delivered_to(&id("far")).is_empty());
        assert_eq!(f.store.raw_tenant("final").unwrap()["isInTrial"], true);
    }

    #[tokio::test]
    async fn trial_ending_now_gets_final_notice() {
        let f = fixture();
        seed(&f.store, "edge", NOW);

        let report = f.handler.handle(SweepExpiringTrialsCommand).await.unwrap();

        assert_eq!(report.final_notices, 1);
        assert_eq!(report.expired, 0);
        assert_eq!(f.notifier.delivered_to(&id("edge")), vec![TrialNoticeKind::Final]);
        assert_eq!(f.store.raw_tenant("edge").unwrap()["isInTrial"], true);
    }

    #[tokio::test]
    async fn second_run_does_not_repeat_notices() {
        let f = fixture();
        seed(&f.store, "soon", NOW.plus_days(2));

        f.handler.handle(SweepExpiringTrialsCommand).await.unwrap();
        f.handler.handle(SweepExpiringTrialsCommand).await.unwrap();

        assert_eq!(f.notifier.delivered().len(), 1);
    }

    #[tokio::test]
    async fn expired_tenant_leaves_the_next_sweep() {
        let f = fixture();
        seed(&f.store, "late", NOW.plus_days(-1));

        f.handler.handle(SweepExpiringTrialsCommand).await.unwrap();
        let second = f.handler.handle(SweepExpiringTrialsCommand).await.unwrap();

        assert_eq!(second.examined, 0);
    }

    struct FailingNotifier;

    #[async_trait]
    impl TrialNotifier for FailingNotifier {
        async fn notify(&self, _: &TrialNotice) -> Result<bool, DomainError> {
            Err(DomainError::new(ErrorCode::NotificationError, "Simulated delivery failure"))
        }
    }

    #[tokio::test]
    async fn per_tenant_failures_are_counted_not_fatal() {
        let clock = Arc::new(FixedClock::new(NOW));
        let store = Arc::new(InMemoryRecordStore::new(clock.clone()));
        seed(&store, "a", NOW.plus_days(2));
        seed(&store, "b", NOW.plus_millis(-5));
        let handler = SweepExpiringTrialsHandler::new(
            store.clone(),
            Arc::new(FailingNotifier),
            Arc::new(InMemoryEventBus::new()),
            clock,
        );

        let report = handler.handle(SweepExpiringTrialsCommand).await.unwrap();

        assert_eq!(report.failures, 2);
        assert_eq!(store.raw_tenant("b").unwrap()["status"], "inactive");
    }

    #[tokio::test]
    async fn listing_failure_aborts_the_run() {
        let f = fixture();
        f.store.set_unavailable(true);

        assert!(f.handler.handle(SweepExpiringTrialsCommand).await.is_err());
    }
}
