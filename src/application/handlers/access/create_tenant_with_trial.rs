//! CreateTenantWithTrialHandler - Onboards a tenant straight into a trial.

use std::sync::Arc;

use crate::domain::access::{compute_end_instant, AccessError, Tenant, TenantDraft, TrialProvenance, TrialStarted};
use crate::domain::foundation::{EpochMillis, EventId, ScopeId, SerializableDomainEvent, TenantId};
use crate::ports::{Clock, EventPublisher, TenantRepository};

use super::{publish_audit, ResolveTrialDefinitionHandler};

/// Command to create a tenant whose trial starts now.
#[derive(Debug, Clone)]
pub struct CreateTenantWithTrialCommand {
    pub draft: TenantDraft,
    /// Scope the trial definition is looked up in.
    pub scope_id: ScopeId,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateTenantWithTrialResult {
    pub tenant_id: TenantId,
    pub trial_start_date: EpochMillis,
    pub trial_end_date: EpochMillis,
    pub provenance: TrialProvenance,
}

pub struct CreateTenantWithTrialHandler {
    tenants: Arc<dyn TenantRepository>,
    definitions: Arc<ResolveTrialDefinitionHandler>,
    event_publisher: Arc<dyn EventPublisher>,
    clock: Arc<dyn Clock>,
}

impl CreateTenantWithTrialHandler {
    pub fn new(
        tenants: Arc<dyn TenantRepository>,
        definitions: Arc<ResolveTrialDefinitionHandler>,
        event_publisher: Arc<dyn EventPublisher>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            tenants,
            definitions,
            event_publisher,
            clock,
        }
    }

    pub async fn handle(
        &self,
        cmd: CreateTenantWithTrialCommand,
    ) -> Result<CreateTenantWithTrialResult, AccessError> {
        let now = self.clock.now();

        // 1. Work out how long the trial runs
        let duration = self.definitions.duration_for(&cmd.scope_id, now).await?;
        let trial_end_date = compute_end_instant(now, duration.days, duration.minutes);

        // 2. Persist the tenant
        let tenant_id = cmd.draft.id.clone().unwrap_or_else(TenantId::generate);
        let tenant = Tenant::start_trial(
            tenant_id.clone(),
            cmd.draft,
            now,
            trial_end_date,
            duration.provenance.clone(),
        );
        self.tenants.insert(&tenant).await?;

        tracing::info!(
            tenant_id = %tenant_id,
            scope = %cmd.scope_id,
            source = ?duration.provenance.source,
            days = duration.days,
            minutes = duration.minutes,
            "tenant created with trial"
        );

        // 3. Record where the duration came from
        let event = TrialStarted {
            event_id: EventId::new(),
            tenant_id: tenant_id.clone(),
            trial_start_date: now,
            trial_end_date,
            provenance: duration.provenance.clone(),
            occurred_at: now,
        };
        publish_audit(self.event_publisher.as_ref(), event.to_envelope()).await;

        Ok(CreateTenantWithTrialResult {
            tenant_id,
            trial_start_date: now,
            trial_end_date,
            provenance: duration.provenance,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::clock::FixedClock;
    use crate::adapters::events::InMemoryEventBus;
    use crate::adapters::memory::InMemoryRecordStore;
    use crate::domain::access::ConfigSource;
    use serde_json::json;

    const NOW: EpochMillis = EpochMillis::new(1_705_276_800_000);

    struct Fixture {
        store: Arc<InMemoryRecordStore>,
        bus: Arc<InMemoryEventBus>,
        handler: CreateTenantWithTrialHandler,
    }

    fn fixture() -> Fixture {
        let clock = Arc::new(FixedClock::new(NOW));
        let store = Arc::new(InMemoryRecordStore::new(clock.clone()));
        let bus = Arc::new(InMemoryEventBus::new());
        let definitions = Arc::new(ResolveTrialDefinitionHandler::new(
            store.clone(),
            ScopeId::new("admin").unwrap(),
        ));
        let handler = CreateTenantWithTrialHandler::new(store.clone(), definitions, bus.clone(), clock);
        Fixture { store, bus, handler }
    }

    fn command(id: &str) -> CreateTenantWithTrialCommand {
        CreateTenantWithTrialCommand {
            draft: TenantDraft {
                id: Some(TenantId::new(id).unwrap()),
                business_name: Some("Corner Bakery".to_string()),
                email: None,
            },
            scope_id: ScopeId::new(id).unwrap(),
        }
    }

    #[tokio::test]
    async fn uses_global_definition_when_scope_has_none() {
        let f = fixture();
        f.store.insert_raw_trial_config(
            "admin",
            json!({"trialPeriods": [{"id": "1", "name": "Two weeks", "days": 14, "minutes": 0, "isActive": true}]}),
        );

        let result = f.handler.handle(command("biz-1")).await.unwrap();

        assert_eq!(result.trial_start_date, NOW);
        assert_eq!(
            result.trial_end_date.as_millis() - result.trial_start_date.as_millis(),
            1_209_600_000
        );
        assert_eq!(result.provenance.source, ConfigSource::GlobalScope);
        assert_eq!(result.provenance.period_name.as_deref(), Some("Two weeks"));
    }

    #[tokio::test]
    async fn persists_tenant_in_trial() {
        let f = fixture();

        f.handler.handle(command("biz-1")).await.unwrap();

        let raw = f.store.raw_tenant("biz-1").unwrap();
        assert_eq!(raw["isInTrial"], true);
        assert_eq!(raw["status"], "active");
        assert_eq!(raw["businessName"], "Corner Bakery");
        assert_eq!(raw["trialInfo"]["source"], "built_in_default");
    }

    #[tokio::test]
    async fn publishes_trial_started() {
        let f = fixture();

        f.handler.handle(command("biz-1")).await.unwrap();

        let events = f.bus.events_of_type("tenant.trial_started.v1");
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].aggregate_id, "biz-1");
    }

    #[tokio::test]
    async fn event_failure_does_not_fail_creation() {
        let f = fixture();
        f.bus.set_failing(true);

        let result = f.handler.handle(command("biz-1")).await;

        assert!(result.is_ok());
        assert!(f.store.raw_tenant("biz-1").is_some());
    }

    #[tokio::test]
    async fn generates_id_when_draft_has_none() {
        let f = fixture();
        let cmd = CreateTenantWithTrialCommand {
            draft: TenantDraft::default(),
            scope_id: ScopeId::new("admin").unwrap(),
        };

        let result = f.handler.handle(cmd).await.unwrap();

        assert!(f.store.raw_tenant(result.tenant_id.as_str()).is_some());
    }

    #[tokio::test]
    async fn duplicate_tenant_is_a_validation_error() {
        let f = fixture();
        f.handler.handle(command("biz-1")).await.unwrap();

        let err = f.handler.handle(command("biz-1")).await.unwrap_err();

        assert!(matches!(err, AccessError::ValidationFailed { .. }));
    }
}
