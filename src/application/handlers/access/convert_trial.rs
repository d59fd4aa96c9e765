//! ConvertTrialHandler - Turns a trial into a paid subscription.
//!
//! Writes the new subscription record first, then flips the tenant. If the
//! tenant write fails after the record exists, the next resolution still
//! sees a live subscription and reports `active_subscription`, healing the
//! stale trial flag itself.

use std::sync::Arc;

use crate::domain::access::{
    AccessError, SubscriptionRecord, SubscriptionStatus, TenantPatch, TrialConverted,
};
use crate::domain::foundation::{EpochMillis, EventId, PlanId, SerializableDomainEvent, SubscriptionId, TenantId};
use crate::ports::{Clock, EventPublisher, PlanReader, SubscriptionRepository, TenantRepository};

use super::publish_audit;

#[derive(Debug, Clone)]
pub struct ConvertTrialCommand {
    pub tenant_id: TenantId,
    pub plan_id: PlanId,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConvertTrialResult {
    /// `false` when the tenant or the plan does not exist.
    pub converted: bool,
    pub subscription_id: Option<SubscriptionId>,
    pub end_date: Option<EpochMillis>,
}

impl ConvertTrialResult {
    fn not_converted() -> Self {
        Self {
            converted: false,
            subscription_id: None,
            end_date: None,
        }
    }
}

pub struct ConvertTrialHandler {
    tenants: Arc<dyn TenantRepository>,
    subscriptions: Arc<dyn SubscriptionRepository>,
    plans: Arc<dyn PlanReader>,
    event_publisher: Arc<dyn EventPublisher>,
    clock: Arc<dyn Clock>,
}

impl ConvertTrialHandler {
    pub fn new(
        tenants: Arc<dyn TenantRepository>,
        subscriptions: Arc<dyn SubscriptionRepository>,
        plans: Arc<dyn PlanReader>,
        event_publisher: Arc<dyn EventPublisher>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            tenants,
            subscriptions,
            plans,
            event_publisher,
            clock,
        }
    }

    pub async fn handle(&self, cmd: ConvertTrialCommand) -> Result<ConvertTrialResult, AccessError> {
        // 1. Both sides must exist
        if self.tenants.find_by_id(&cmd.tenant_id).await?.is_none() {
            tracing::info!(tenant_id = %cmd.tenant_id, "conversion skipped, tenant not found");
            return Ok(ConvertTrialResult::not_converted());
        }
        let Some(plan) = self.plans.find_by_id(&cmd.plan_id).await? else {
            tracing::info!(tenant_id = %cmd.tenant_id, plan_id = %cmd.plan_id, "conversion skipped, plan not found");
            return Ok(ConvertTrialResult::not_converted());
        };

        // 2. Create the paid period
        let start_date = self.clock.now();
        let end_date = plan.billing_cycle.period_end(start_date);
        let record = SubscriptionRecord {
            id: SubscriptionId::generate(),
            tenant_id: cmd.tenant_id.clone(),
            plan_id: plan.id.clone(),
            start_date,
            end_date,
            status: SubscriptionStatus::Active,
            auto_renew: false,
            cancel_date: None,
            billing_cycle: Some(plan.billing_cycle),
            price: Some(plan.price),
            currency: Some(plan.currency.clone()).filter(|c| !c.is_empty()),
            notes: Some("Converted from trial".to_string()),
        };
        self.subscriptions.insert(&record).await?;

        // 3. Take the tenant out of trial
        let applied = self
            .tenants
            .apply_patch(&cmd.tenant_id, &TenantPatch::converted(plan.id.clone(), start_date))
            .await?;
        if !applied {
            tracing::warn!(tenant_id = %cmd.tenant_id, subscription_id = %record.id, "tenant vanished during conversion");
            return Ok(ConvertTrialResult::not_converted());
        }

        tracing::info!(
            tenant_id = %cmd.tenant_id,
            plan_id = %plan.id,
            subscription_id = %record.id,
            end_date = %end_date,
            "trial converted to subscription"
        );

        let event = TrialConverted {
            event_id: EventId::new(),
            tenant_id: cmd.tenant_id,
            subscription_id: record.id.clone(),
            plan_id: plan.id,
            start_date,
            end_date,
            occurred_at: start_date,
        };
        publish_audit(self.event_publisher.as_ref(), event.to_envelope()).await;

        Ok(ConvertTrialResult {
            converted: true,
            subscription_id: Some(record.id),
            end_date: Some(end_date),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::clock::FixedClock;
    use crate::adapters::events::InMemoryEventBus;
    use crate::adapters::memory::InMemoryRecordStore;
    use chrono::{TimeZone, Utc};
    use serde_json::json;

    fn jan_31() -> EpochMillis {
        EpochMillis::from_datetime(Utc.with_ymd_and_hms(2024, 1, 31, 12, 0, 0).unwrap())
    }

    fn setup() -> (Arc<InMemoryRecordStore>, Arc<InMemoryEventBus>, ConvertTrialHandler) {
        let clock = Arc::new(FixedClock::new(jan_31()));
        let store = Arc::new(InMemoryRecordStore::new(clock.clone()));
        let bus = Arc::new(InMemoryEventBus::new());
        let handler = ConvertTrialHandler::new(store.clone(), store.clone(), store.clone(), bus.clone(), clock);
        store.insert_raw_tenant("biz-1", json!({"isInTrial": true, "trialEndDate": jan_31().plus_days(3).as_millis()}));
        store.insert_raw_plan("monthly", json!({"name": "Monthly", "price": 19.0, "currency": "EUR", "billingCycle": "monthly"}));
        store.insert_raw_plan("yearly", json!({"name": "Yearly", "price": 190.0, "billingCycle": "yearly"}));
        store.insert_raw_plan("quarterly", json!({"name": "Quarterly", "billingCycle": "quarterly"}));
        (store, bus, handler)
    }

    fn convert(tenant: &str, plan: &str) -> ConvertTrialCommand {
        ConvertTrialCommand {
            tenant_id: TenantId::new(tenant).unwrap(),
            plan_id: PlanId::new(plan).unwrap(),
        }
    }

    #[tokio::test]
    async fn monthly_plan_uses_calendar_month() {
        let (store, _, handler) = setup();

        let result = handler.handle(convert("biz-1", "monthly")).await.unwrap();

        assert!(result.converted);
        let expected = EpochMillis::from_datetime(Utc.with_ymd_and_hms(2024, 2, 29, 12, 0, 0).unwrap());
        assert_eq!(result.end_date, Some(expected));

        let raw = store.raw_tenant("biz-1").unwrap();
        assert_eq!(raw["isInTrial"], false);
        assert_eq!(raw["status"], "active");
        assert_eq!(raw["subscriptionPlanId"], "monthly");
    }

    #[tokio::test]
    async fn yearly_plan_adds_a_calendar_year() {
        let (_, _, handler) = setup();

        let result = handler.handle(convert("biz-1", "yearly")).await.unwrap();

        let expected = EpochMillis::from_datetime(Utc.with_ymd_and_hms(2025, 1, 31, 12, 0, 0).unwrap());
        assert_eq!(result.end_date, Some(expected));
    }

    #[tokio::test]
    async fn other_cycles_get_thirty_days() {
        let (_, _, handler) = setup();

        let result = handler.handle(convert("biz-1", "quarterly")).await.unwrap();

        assert_eq!(result.end_date, Some(jan_31().plus_days(30)));
    }

    #[tokio::test]
    async fn creates_active_subscription_record() {
        let (store, bus, handler) = setup();

        handler.handle(convert("biz-1", "monthly")).await.unwrap();

        let records = store
            .list_for_tenant(&TenantId::new("biz-1").unwrap())
            .await
            .unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].status, SubscriptionStatus::Active);
        assert_eq!(records[0].currency.as_deref(), Some("EUR"));
        assert!(bus.has_event("tenant.trial_converted.v1"));
    }

    #[tokio::test]
    async fn missing_plan_or_tenant_returns_false() {
        let (store, _, handler) = setup();

        assert!(!handler.handle(convert("biz-1", "nope")).await.unwrap().converted);
        assert!(!handler.handle(convert("ghost", "monthly")).await.unwrap().converted);
        assert_eq!(store.patch_count(), 0);
    }
}
