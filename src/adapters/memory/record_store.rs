//! In-memory document store implementing every record-store port.
//!
//! Documents are kept as raw JSON so tests can seed them in any of the
//! shapes found in production and exercise the same normalization the
//! Postgres adapter goes through.
//!
//! # Usage
//!
//! ```ignore
//! let store = Arc::new(InMemoryRecordStore::new(clock.clone()));
//! store.insert_raw_tenant("biz-1", json!({"isInTrial": true, "trialEndDate": "2024-02-01"}));
//! let tenants: Arc<dyn TenantRepository> = store.clone();
//! ```

use async_trait::async_trait;
use serde::Serialize;
use serde_json::{Map, Value as JsonValue};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};

use crate::adapters::documents::{
    order_by_start, parse_plan, parse_subscription, parse_tenant, parse_trial_config,
};
use crate::domain::access::{
    SubscriptionPlan, SubscriptionRecord, Tenant, TenantPatch, TrialPeriodsConfig,
};
use crate::domain::foundation::{DomainError, ErrorCode, PlanId, ScopeId, TenantId};
use crate::ports::{Clock, PlanReader, SubscriptionRepository, TenantRepository, TrialConfigStore};

type Collection = RwLock<BTreeMap<String, JsonValue>>;

pub struct InMemoryRecordStore {
    clock: Arc<dyn Clock>,
    tenants: Collection,
    subscriptions: Collection,
    plans: Collection,
    trial_configs: Collection,
    unavailable: AtomicBool,
    patches_applied: AtomicUsize,
}

impl InMemoryRecordStore {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            tenants: RwLock::new(BTreeMap::new()),
            subscriptions: RwLock::new(BTreeMap::new()),
            plans: RwLock::new(BTreeMap::new()),
            trial_configs: RwLock::new(BTreeMap::new()),
            unavailable: AtomicBool::new(false),
            patches_applied: AtomicUsize::new(0),
        }
    }

    // === Seeding and inspection ===

    pub fn insert_raw_tenant(&self, id: &str, body: JsonValue) {
        write_raw(&self.tenants, id, body);
    }

    pub fn insert_raw_subscription(&self, id: &str, body: JsonValue) {
        write_raw(&self.subscriptions, id, body);
    }

    pub fn insert_raw_plan(&self, id: &str, body: JsonValue) {
        write_raw(&self.plans, id, body);
    }

    pub fn insert_raw_trial_config(&self, scope: &str, body: JsonValue) {
        write_raw(&self.trial_configs, scope, body);
    }

    pub fn raw_tenant(&self, id: &str) -> Option<JsonValue> {
        self.tenants
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(id)
            .cloned()
    }

    /// Number of tenant merge writes performed so far.
    pub fn patch_count(&self) -> usize {
        self.patches_applied.load(Ordering::SeqCst)
    }

    /// Makes every port call fail with `DatabaseError`.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn ensure_available(&self) -> Result<(), DomainError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(DomainError::new(ErrorCode::DatabaseError, "Record store unavailable"));
        }
        Ok(())
    }
}

fn write_raw(collection: &Collection, id: &str, body: JsonValue) {
    collection
        .write()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
        .insert(id.to_string(), body);
}

fn lock_error() -> DomainError {
    DomainError::new(ErrorCode::InternalError, "Record store lock poisoned")
}

fn to_document<T: Serialize>(value: &T) -> Result<JsonValue, DomainError> {
    serde_json::to_value(value)
        .map_err(|e| DomainError::new(ErrorCode::SerializationError, e.to_string()))
}

/// Top-level key merge, the same semantics as JSONB `||`.
fn merge_into(target: &mut JsonValue, patch: JsonValue) {
    if let (Some(target), JsonValue::Object(patch)) = (target.as_object_mut(), patch) {
        for (key, value) in patch {
            target.insert(key, value);
        }
    }
}

#[async_trait]
impl TenantRepository for InMemoryRecordStore {
    async fn find_by_id(&self, id: &TenantId) -> Result<Option<Tenant>, DomainError> {
        self.ensure_available()?;
        let body = self
            .tenants
            .read()
            .map_err(|_| lock_error())?
            .get(id.as_str())
            .cloned();

        body.map(|body| parse_tenant(id.clone(), body, self.clock.now()))
            .transpose()
    }

    async fn insert(&self, tenant: &Tenant) -> Result<(), DomainError> {
        self.ensure_available()?;
        let body = to_document(tenant)?;
        let mut tenants = self.tenants.write().map_err(|_| lock_error())?;
        if tenants.contains_key(tenant.id.as_str()) {
            return Err(DomainError::validation("id", format!("Tenant {} already exists", tenant.id)));
        }
        tenants.insert(tenant.id.to_string(), body);
        Ok(())
    }

    async fn apply_patch(&self, id: &TenantId, patch: &TenantPatch) -> Result<bool, DomainError> {
        self.ensure_available()?;
        let patch_body = to_document(patch)?;
        let mut tenants = self.tenants.write().map_err(|_| lock_error())?;
        let Some(body) = tenants.get_mut(id.as_str()) else {
            return Ok(false);
        };
        if !body.is_object() {
            *body = JsonValue::Object(Map::new());
        }
        merge_into(body, patch_body);
        self.patches_applied.fetch_add(1, Ordering::SeqCst);
        Ok(true)
    }

    async fn list_in_trial(&self) -> Result<Vec<Tenant>, DomainError> {
        self.ensure_available()?;
        let now = self.clock.now();
        let snapshot: Vec<(String, JsonValue)> = self
            .tenants
            .read()
            .map_err(|_| lock_error())?
            .iter()
            .filter(|(_, body)| body.get("isInTrial").and_then(JsonValue::as_bool) == Some(true))
            .map(|(id, body)| (id.clone(), body.clone()))
            .collect();

        snapshot
            .into_iter()
            .map(|(id, body)| parse_tenant(TenantId::new(id)?, body, now))
            .collect()
    }
}

#[async_trait]
impl SubscriptionRepository for InMemoryRecordStore {
    async fn list_for_tenant(&self, tenant_id: &TenantId) -> Result<Vec<SubscriptionRecord>, DomainError> {
        self.ensure_available()?;
        let now = self.clock.now();
        let mut records: Vec<SubscriptionRecord> = self
            .subscriptions
            .read()
            .map_err(|_| lock_error())?
            .iter()
            .filter(|(_, body)| {
                let owner = body.get("clientId").or_else(|| body.get("tenantId"));
                owner.and_then(JsonValue::as_str) == Some(tenant_id.as_str())
            })
            .filter_map(|(id, body)| parse_subscription(id, body.clone(), now))
            .collect();

        order_by_start(&mut records);
        Ok(records)
    }

    async fn insert(&self, record: &SubscriptionRecord) -> Result<(), DomainError> {
        self.ensure_available()?;
        let body = to_document(record)?;
        self.subscriptions
            .write()
            .map_err(|_| lock_error())?
            .insert(record.id.to_string(), body);
        Ok(())
    }
}

#[async_trait]
impl PlanReader for InMemoryRecordStore {
    async fn find_by_id(&self, id: &PlanId) -> Result<Option<SubscriptionPlan>, DomainError> {
        self.ensure_available()?;
        let body = self
            .plans
            .read()
            .map_err(|_| lock_error())?
            .get(id.as_str())
            .cloned();

        body.map(|body| parse_plan(id.clone(), body)).transpose()
    }
}

#[async_trait]
impl TrialConfigStore for InMemoryRecordStore {
    async fn find_by_scope(&self, scope: &ScopeId) -> Result<Option<TrialPeriodsConfig>, DomainError> {
        self.ensure_available()?;
        let body = self
            .trial_configs
            .read()
            .map_err(|_| lock_error())?
            .get(scope.as_str())
            .cloned();

        Ok(body.and_then(|body| parse_trial_config(scope.as_str(), body)))
    }

    async fn save(&self, scope: &ScopeId, config: &TrialPeriodsConfig) -> Result<(), DomainError> {
        self.ensure_available()?;
        let body = to_document(config)?;
        self.trial_configs
            .write()
            .map_err(|_| lock_error())?
            .insert(scope.to_string(), body);
        Ok(())
    }
}
