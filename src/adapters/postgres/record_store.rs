//! PostgreSQL implementation of the record-store ports.
//!
//! Every collection is a `(id, body JSONB)` table. Reads go through the
//! shared document mapping, so stored instants are normalized exactly as
//! they are for the in-memory store. Tenant writes are `body || patch`, a
//! single-statement merge.

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value as JsonValue;
use sqlx::PgPool;
use std::sync::Arc;

use crate::adapters::documents::{
    order_by_start, parse_plan, parse_subscription, parse_tenant, parse_trial_config,
};
use crate::domain::access::{
    SubscriptionPlan, SubscriptionRecord, Tenant, TenantPatch, TrialPeriodsConfig,
};
use crate::domain::foundation::{DomainError, ErrorCode, PlanId, ScopeId, TenantId};
use crate::ports::{Clock, PlanReader, SubscriptionRepository, TenantRepository, TrialConfigStore};

/// PostgreSQL-backed tenant, subscription, plan and trial-config store.
pub struct PostgresRecordStore {
    pool: PgPool,
    clock: Arc<dyn Clock>,
}

impl PostgresRecordStore {
    pub fn new(pool: PgPool, clock: Arc<dyn Clock>) -> Self {
        Self { pool, clock }
    }
}

fn db_error(action: &str, e: sqlx::Error) -> DomainError {
    DomainError::new(ErrorCode::DatabaseError, format!("Failed to {}: {}", action, e))
}

fn to_document<T: Serialize>(value: &T) -> Result<JsonValue, DomainError> {
    serde_json::to_value(value)
        .map_err(|e| DomainError::new(ErrorCode::SerializationError, e.to_string()))
}

#[async_trait]
impl TenantRepository for PostgresRecordStore {
    async fn find_by_id(&self, id: &TenantId) -> Result<Option<Tenant>, DomainError> {
        let body: Option<(JsonValue,)> = sqlx::query_as("SELECT body FROM tenants WHERE id = $1")
            .bind(id.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| db_error("find tenant", e))?;

        body.map(|(body,)| parse_tenant(id.clone(), body, self.clock.now()))
            .transpose()
    }

    async fn insert(&self, tenant: &Tenant) -> Result<(), DomainError> {
        let body = to_document(tenant)?;

        sqlx::query("INSERT INTO tenants (id, body) VALUES ($1, $2)")
            .bind(tenant.id.as_str())
            .bind(body)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                if let sqlx::Error::Database(db_err) = &e {
                    if db_err.constraint() == Some("tenants_pkey") {
                        return DomainError::validation(
                            "id",
                            format!("Tenant {} already exists", tenant.id),
                        );
                    }
                }
                db_error("insert tenant", e)
            })?;

        Ok(())
    }

    async fn apply_patch(&self, id: &TenantId, patch: &TenantPatch) -> Result<bool, DomainError> {
        let patch_body = to_document(patch)?;

        let result = sqlx::query(
            r#"
            UPDATE tenants
            SET body = body || $2::jsonb,
                updated_at = now()
            WHERE id = $1
            "#,
        )
        .bind(id.as_str())
        .bind(patch_body)
        .execute(&self.pool)
        .await
        .map_err(|e| db_error("patch tenant", e))?;

        Ok(result.rows_affected() > 0)
    }

    async fn list_in_trial(&self) -> Result<Vec<Tenant>, DomainError> {
        let rows: Vec<(String, JsonValue)> = sqlx::query_as(
            r#"
            SELECT id, body FROM tenants
            WHERE body -> 'isInTrial' = 'true'::jsonb
            ORDER BY id
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_error("list tenants in trial", e))?;

        let now = self.clock.now();
        rows.into_iter()
            .map(|(id, body)| parse_tenant(TenantId::new(id)?, body, now))
            .collect()
    }
}

#[async_trait]
impl SubscriptionRepository for PostgresRecordStore {
    async fn list_for_tenant(&self, tenant_id: &TenantId) -> Result<Vec<SubscriptionRecord>, DomainError> {
        let rows: Vec<(String, JsonValue)> =
            sqlx::query_as("SELECT id, body FROM subscriptions WHERE tenant_id = $1")
                .bind(tenant_id.as_str())
                .fetch_all(&self.pool)
                .await
                .map_err(|e| db_error("list subscriptions", e))?;

        // Start dates are only comparable after normalization.
        let now = self.clock.now();
        let mut records: Vec<SubscriptionRecord> = rows
            .into_iter()
            .filter_map(|(id, body)| parse_subscription(&id, body, now))
            .collect();
        order_by_start(&mut records);
        Ok(records)
    }

    async fn insert(&self, record: &SubscriptionRecord) -> Result<(), DomainError> {
        let body = to_document(record)?;

        sqlx::query("INSERT INTO subscriptions (id, body) VALUES ($1, $2)")
            .bind(record.id.as_str())
            .bind(body)
            .execute(&self.pool)
            .await
            .map_err(|e| db_error("insert subscription", e))?;

        Ok(())
    }
}

#[async_trait]
impl PlanReader for PostgresRecordStore {
    async fn find_by_id(&self, id: &PlanId) -> Result<Option<SubscriptionPlan>, DomainError> {
        let body: Option<(JsonValue,)> =
            sqlx::query_as("SELECT body FROM subscription_plans WHERE id = $1")
                .bind(id.as_str())
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| db_error("find plan", e))?;

        body.map(|(body,)| parse_plan(id.clone(), body)).transpose()
    }
}

#[async_trait]
impl TrialConfigStore for PostgresRecordStore {
    async fn find_by_scope(&self, scope: &ScopeId) -> Result<Option<TrialPeriodsConfig>, DomainError> {
        let body: Option<(JsonValue,)> =
            sqlx::query_as("SELECT body FROM trial_configs WHERE scope_id = $1")
                .bind(scope.as_str())
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| db_error("find trial config", e))?;

        Ok(body.and_then(|(body,)| parse_trial_config(scope.as_str(), body)))
    }

    async fn save(&self, scope: &ScopeId, config: &TrialPeriodsConfig) -> Result<(), DomainError> {
        let body = to_document(config)?;

        sqlx::query(
            r#"
            INSERT INTO trial_configs (scope_id, body)
            VALUES ($1, $2)
            ON CONFLICT (scope_id) DO UPDATE
            SET body = EXCLUDED.body,
                updated_at = now()
            "#,
        )
        .bind(scope.as_str())
        .bind(body)
        .execute(&self.pool)
        .await
        .map_err(|e| db_error("save trial config", e))?;

        Ok(())
    }
}
