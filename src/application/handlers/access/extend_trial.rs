//! ExtendTrialHandler - Pushes a tenant's trial end back.
//!
//! The new end is the previous end (or now, when none is recorded) plus the
//! requested days and minutes. The merge always sets `isInTrial=true` and
//! `status=active`, whatever the tenant's paid history. Calling this on a
//! cancelled, previously paying tenant therefore puts them back into trial;
//! that behaviour is kept as-is and callers decide who may be extended.

use std::sync::Arc;

use crate::domain::access::{compute_end_instant, AccessError, TenantPatch, TrialExtended, MAX_TRIAL_DAYS};
use crate::domain::foundation::{EpochMillis, EventId, SerializableDomainEvent, TenantId};
use crate::ports::{Clock, EventPublisher, TenantRepository};

use super::publish_audit;

#[derive(Debug, Clone)]
pub struct ExtendTrialCommand {
    pub tenant_id: TenantId,
    pub additional_days: u32,
    pub additional_minutes: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtendTrialResult {
    /// `false` when the tenant does not exist.
    pub extended: bool,
    pub trial_end_date: Option<EpochMillis>,
}

impl ExtendTrialResult {
    fn not_found() -> Self {
        Self {
            extended: false,
            trial_end_date: None,
        }
    }
}

pub struct ExtendTrialHandler {
    tenants: Arc<dyn TenantRepository>,
    event_publisher: Arc<dyn EventPublisher>,
    clock: Arc<dyn Clock>,
}

impl ExtendTrialHandler {
    pub fn new(
        tenants: Arc<dyn TenantRepository>,
        event_publisher: Arc<dyn EventPublisher>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            tenants,
            event_publisher,
            clock,
        }
    }

    pub async fn handle(&self, cmd: ExtendTrialCommand) -> Result<ExtendTrialResult, AccessError> {
        if cmd.additional_days > MAX_TRIAL_DAYS {
            return Err(AccessError::validation(
                "additionalDays",
                format!("must be at most {}", MAX_TRIAL_DAYS),
            ));
        }

        let Some(tenant) = self.tenants.find_by_id(&cmd.tenant_id).await? else {
            tracing::info!(tenant_id = %cmd.tenant_id, "trial extension skipped, tenant not found");
            return Ok(ExtendTrialResult::not_found());
        };

        let now = self.clock.now();
        let base = tenant.trial_end_date.unwrap_or(now);
        let new_end = compute_end_instant(base, cmd.additional_days, cmd.additional_minutes);

        let applied = self
            .tenants
            .apply_patch(&cmd.tenant_id, &TenantPatch::extend_trial(new_end))
            .await?;
        if !applied {
            return Ok(ExtendTrialResult::not_found());
        }

        tracing::info!(
            tenant_id = %cmd.tenant_id,
            additional_days = cmd.additional_days,
            additional_minutes = cmd.additional_minutes,
            new_end = %new_end,
            was_in_trial = tenant.is_in_trial,
            "trial extended"
        );

        let event = TrialExtended {
            event_id: EventId::new(),
            tenant_id: cmd.tenant_id,
            previous_end_date: tenant.trial_end_date,
            new_end_date: new_end,
            additional_days: cmd.additional_days,
            additional_minutes: cmd.additional_minutes,
            occurred_at: now,
        };
        publish_audit(self.event_publisher.as_ref(), event.to_envelope()).await;

        Ok(ExtendTrialResult {
            extended: true,
            trial_end_date: Some(new_end),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::clock::FixedClock;
    use crate::adapters::events::InMemoryEventBus;
    use crate::adapters::memory::InMemoryRecordStore;
    use serde_json::json;

    const NOW: EpochMillis = EpochMillis::new(1_705_276_800_000);

    fn setup() -> (Arc<InMemoryRecordStore>, Arc<InMemoryEventBus>, ExtendTrialHandler) {
        let clock = Arc::new(FixedClock::new(NOW));
        let store = Arc::new(InMemoryRecordStore::new(clock.clone()));
        let bus = Arc::new(InMemoryEventBus::new());
        let handler = ExtendTrialHandler::new(store.clone(), bus.clone(), clock);
        (store, bus, handler)
    }

    fn extend(days: u32, minutes: u32) -> ExtendTrialCommand {
        ExtendTrialCommand {
            tenant_id: TenantId::new("biz-1").unwrap(),
            additional_days: days,
            additional_minutes: minutes,
        }
    }

    #[tokio::test]
    async fn adds_exactly_seven_days_to_previous_end() {
        let (store, _, handler) = setup();
        let end = NOW.plus_days(-2);
        store.insert_raw_tenant(
            "biz-1",
            json!({"isInTrial": false, "status": "inactive", "trialEndDate": end.as_millis()}),
        );

        let result = handler.handle(extend(7, 0)).await.unwrap();

        assert!(result.extended);
        let raw = store.raw_tenant("biz-1").unwrap();
        assert_eq!(raw["trialEndDate"], end.as_millis() + 604_800_000);
        assert_eq!(raw["isInTrial"], true);
        assert_eq!(raw["status"], "active");
    }

    #[tokio::test]
    async fn missing_end_extends_from_now() {
        let (store, _, handler) = setup();
        store.insert_raw_tenant("biz-1", json!({"isInTrial": true}));

        let result = handler.handle(extend(0, 90)).await.unwrap();

        assert_eq!(result.trial_end_date, Some(NOW.plus_minutes(90)));
    }

    #[tokio::test]
    async fn unknown_tenant_returns_false() {
        let (store, bus, handler) = setup();

        let result = handler.handle(extend(7, 0)).await.unwrap();

        assert!(!result.extended);
        assert_eq!(store.patch_count(), 0);
        assert_eq!(bus.event_count(), 0);
    }

    #[tokio::test]
    async fn records_previous_and_new_end() {
        let (store, bus, handler) = setup();
        store.insert_raw_tenant("biz-1", json!({"isInTrial": true, "trialEndDate": NOW.as_millis()}));

        handler.handle(extend(1, 0)).await.unwrap();

        let events = bus.events_of_type("tenant.trial_extended.v1");
        assert_eq!(events.len(), 1);
        let event: TrialExtended = events[0].payload_as().unwrap();
        assert_eq!(event.previous_end_date, Some(NOW));
        assert_eq!(event.new_end_date, NOW.plus_days(1));
    }

    #[tokio::test]
    async fn absurd_extension_is_rejected() {
        let (_, _, handler) = setup();

        let err = handler.handle(extend(MAX_TRIAL_DAYS + 1, 0)).await.unwrap_err();

        assert!(matches!(err, AccessError::ValidationFailed { .. }));
    }

    #[tokio::test]
    async fn store_failure_propagates() {
        let (store, _, handler) = setup();
        store.insert_raw_tenant("biz-1", json!({"isInTrial": true}));
        store.set_unavailable(true);

        assert!(handler.handle(extend(7, 0)).await.is_err());
    }
}
