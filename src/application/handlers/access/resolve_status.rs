//! ResolveStatusHandler - The authoritative access status for a tenant.
//!
//! A query with one explicit side effect: when the winning rule is
//! `active_subscription` while the stored trial flag is still set, a
//! `TenantPatch::end_trial()` merge is spawned in the background. The
//! returned status never waits on that write, and its failure is only
//! logged. The patch sets the flag unconditionally, so concurrent resolvers
//! issuing it twice converge on the same document.

use std::sync::Arc;

use crate::domain::access::{evaluate, AccessError, AccessSnapshot, Resolution, ResolvedStatus, TenantPatch};
use crate::domain::foundation::TenantId;
use crate::ports::{Clock, SubscriptionRepository, TenantRepository};

/// Query for a tenant's current status.
#[derive(Debug, Clone)]
pub struct ResolveStatusQuery {
    pub tenant_id: TenantId,
}

pub struct ResolveStatusHandler {
    tenants: Arc<dyn TenantRepository>,
    subscriptions: Arc<dyn SubscriptionRepository>,
    clock: Arc<dyn Clock>,
}

impl ResolveStatusHandler {
    pub fn new(
        tenants: Arc<dyn TenantRepository>,
        subscriptions: Arc<dyn SubscriptionRepository>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            tenants,
            subscriptions,
            clock,
        }
    }

    pub async fn handle(&self, query: ResolveStatusQuery) -> Result<ResolvedStatus, AccessError> {
        Ok(self.resolve(&query.tenant_id).await?.status)
    }

    /// Resolves and reports which rule matched.
    ///
    /// An unknown tenant is not an error: the pipeline runs with no tenant
    /// document and whatever subscriptions reference the ID.
    pub async fn resolve(&self, tenant_id: &TenantId) -> Result<Resolution, AccessError> {
        let now = self.clock.now();
        let tenant = self.tenants.find_by_id(tenant_id).await?;
        let subscriptions = self.subscriptions.list_for_tenant(tenant_id).await?;

        let snapshot = AccessSnapshot {
            tenant,
            subscriptions,
            now,
        };
        let resolution = evaluate(&snapshot);

        tracing::debug!(
            tenant_id = %tenant_id,
            rule = resolution.rule,
            status = %resolution.status.status_code,
            "access status resolved"
        );

        if resolution.heal_trial_flag {
            self.spawn_trial_flag_heal(tenant_id.clone());
        }

        Ok(resolution)
    }

    fn spawn_trial_flag_heal(&self, tenant_id: TenantId) {
        let tenants = Arc::clone(&self.tenants);
        tokio::spawn(async move {
            match tenants.apply_patch(&tenant_id, &TenantPatch::end_trial()).await {
                Ok(true) => {
                    tracing::info!(tenant_id = %tenant_id, "cleared stale trial flag on paid tenant")
                }
                Ok(false) => {
                    tracing::warn!(tenant_id = %tenant_id, "stale trial flag not cleared, tenant vanished")
                }
                Err(e) => {
                    tracing::warn!(tenant_id = %tenant_id, error = %e, "failed to clear stale trial flag")
                }
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::clock::FixedClock;
    use crate::adapters::memory::InMemoryRecordStore;
    use crate::domain::access::{StatusCode, Tenant};
    use crate::domain::foundation::{DomainError, EpochMillis, ErrorCode, MILLIS_PER_DAY};
    use async_trait::async_trait;
    use serde_json::json;
    use std::time::Duration;

    const NOW: EpochMillis = EpochMillis::new(1_705_276_800_000);

    fn setup() -> (Arc<InMemoryRecordStore>, ResolveStatusHandler) {
        let clock = Arc::new(FixedClock::new(NOW));
        let store = Arc::new(InMemoryRecordStore::new(clock.clone()));
        let handler = ResolveStatusHandler::new(store.clone(), store.clone(), clock);
        (store, handler)
    }

    fn tenant_id() -> TenantId {
        TenantId::new("biz-1").unwrap()
    }

    async fn wait_for_patches(store: &InMemoryRecordStore, expected: usize) {
        for _ in 0..100 {
            if store.patch_count() >= expected {
                return;
            }
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
    }

    #[tokio::test]
    async fn paid_tenant_with_stale_trial_flag_is_healed() {
        let (store, handler) = setup();
        store.insert_raw_tenant(
            "biz-1",
            json!({"isInTrial": true, "trialEndDate": NOW.plus_days(10).as_millis()}),
        );
        store.insert_raw_subscription(
            "sub-1",
            json!({
                "clientId": "biz-1",
                "planId": "plan-1",
                "status": "active",
                "startDate": NOW.plus_days(-1).as_millis(),
                "endDate": NOW.plus_days(29).as_millis(),
            }),
        );

        let resolution = handler.resolve(&tenant_id()).await.unwrap();

        assert_eq!(resolution.status.status_code, StatusCode::ActiveSubscription);
        assert!(resolution.heal_trial_flag);
        wait_for_patches(&store, 1).await;
        assert_eq!(store.raw_tenant("biz-1").unwrap()["isInTrial"], false);
    }

    #[tokio::test]
    async fn trial_days_use_ceiling() {
        let (store, handler) = setup();
        let end = NOW.plus_millis((4.2 * MILLIS_PER_DAY as f64) as i64);
        store.insert_raw_tenant("biz-1", json!({"isInTrial": true, "trialEndDate": end.as_millis()}));

        let status = handler
            .handle(ResolveStatusQuery { tenant_id: tenant_id() })
            .await
            .unwrap();

        assert_eq!(status.status_code, StatusCode::TrialActive);
        assert_eq!(status.trial_days_remaining, Some(5));
        assert_eq!(store.patch_count(), 0);
    }

    #[tokio::test]
    async fn unknown_tenant_resolves_to_no_subscription() {
        let (_, handler) = setup();

        let status = handler
            .handle(ResolveStatusQuery { tenant_id: tenant_id() })
            .await
            .unwrap();

        assert_eq!(status.status_code, StatusCode::NoSubscription);
    }

    #[tokio::test]
    async fn store_failure_is_propagated() {
        let (store, handler) = setup();
        store.set_unavailable(true);

        let result = handler.handle(ResolveStatusQuery { tenant_id: tenant_id() }).await;

        assert!(matches!(result, Err(AccessError::Infrastructure { .. })));
    }

    struct PatchRejectingTenants {
        inner: Arc<InMemoryRecordStore>,
    }

    #[async_trait]
    impl TenantRepository for PatchRejectingTenants {
        async fn find_by_id(&self, id: &TenantId) -> Result<Option<Tenant>, DomainError> {
            TenantRepository::find_by_id(self.inner.as_ref(), id).await
        }

        async fn insert(&self, tenant: &Tenant) -> Result<(), DomainError> {
            TenantRepository::insert(self.inner.as_ref(), tenant).await
        }

        async fn apply_patch(&self, _: &TenantId, _: &TenantPatch) -> Result<bool, DomainError> {
            Err(DomainError::new(ErrorCode::DatabaseError, "Simulated write failure"))
        }

        async fn list_in_trial(&self) -> Result<Vec<Tenant>, DomainError> {
            self.inner.list_in_trial().await
        }
    }

    #[tokio::test]
    async fn heal_failure_does_not_affect_result() {
        let (store, _) = setup();
        store.insert_raw_tenant("biz-1", json!({"isInTrial": true}));
        store.insert_raw_subscription(
            "sub-1",
            json!({"clientId": "biz-1", "planId": "p", "status": "active", "endDate": NOW.plus_days(3).as_millis()}),
        );
        let tenants = Arc::new(PatchRejectingTenants { inner: store.clone() });
        let handler = ResolveStatusHandler::new(tenants, store.clone(), Arc::new(FixedClock::new(NOW)));

        let first = handler.handle(ResolveStatusQuery { tenant_id: tenant_id() }).await.unwrap();
        tokio::time::sleep(Duration::from_millis(5)).await;
        let second = handler.handle(ResolveStatusQuery { tenant_id: tenant_id() }).await.unwrap();

        assert_eq!(first.status_code, StatusCode::ActiveSubscription);
        assert_eq!(first, second);
        assert_eq!(store.raw_tenant("biz-1").unwrap()["isInTrial"], true);
    }
}
