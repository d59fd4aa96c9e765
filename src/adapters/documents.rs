//! Stored document shapes and their mapping into domain types.
//!
//! Documents are read exactly as they were written by every generation of
//! the admin tooling, so every time field is a [`RawInstant`]. This is the
//! only place instants are normalized; everything past `into_*` works on
//! `EpochMillis`.

use serde::Deserialize;
use serde_json::Value as JsonValue;

use crate::domain::access::{
    BillingCycle, SubscriptionPlan, SubscriptionRecord, SubscriptionStatus, Tenant, TrialPeriodsConfig,
    TrialProvenance, STATUS_ACTIVE,
};
use crate::domain::foundation::{
    DomainError, EpochMillis, ErrorCode, PlanId, RawInstant, SubscriptionId, TenantId,
};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TenantDocument {
    #[serde(default)]
    pub business_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub is_in_trial: Option<bool>,
    #[serde(default)]
    pub trial_start_date: Option<RawInstant>,
    #[serde(default)]
    pub trial_end_date: Option<RawInstant>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub created_at: Option<RawInstant>,
    #[serde(default)]
    pub trial_info: Option<JsonValue>,
    #[serde(default)]
    pub trial_expired_at: Option<RawInstant>,
    #[serde(default)]
    pub subscription_plan_id: Option<String>,
    #[serde(default)]
    pub subscription_start_date: Option<RawInstant>,
}

impl TenantDocument {
    pub fn into_tenant(self, id: TenantId, now: EpochMillis) -> Tenant {
        let trial_info = self
            .trial_info
            .and_then(|raw| serde_json::from_value::<TrialProvenance>(raw).ok());

        Tenant {
            id,
            business_name: self.business_name,
            email: self.email,
            is_in_trial: self.is_in_trial.unwrap_or(false),
            trial_start_date: RawInstant::normalize_optional(self.trial_start_date.as_ref(), now),
            trial_end_date: RawInstant::normalize_optional(self.trial_end_date.as_ref(), now),
            status: self.status.unwrap_or_else(|| STATUS_ACTIVE.to_string()),
            created_at: self.created_at.map_or(now, |raw| raw.normalize(now)),
            trial_info,
            trial_expired_at: RawInstant::normalize_optional(self.trial_expired_at.as_ref(), now),
            subscription_plan_id: self.subscription_plan_id.and_then(|p| PlanId::new(p).ok()),
            subscription_start_date: RawInstant::normalize_optional(
                self.subscription_start_date.as_ref(),
                now,
            ),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionDocument {
    #[serde(alias = "tenantId")]
    pub client_id: String,
    #[serde(default)]
    pub plan_id: Option<String>,
    #[serde(default)]
    pub start_date: Option<RawInstant>,
    #[serde(default)]
    pub end_date: Option<RawInstant>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub auto_renew: Option<bool>,
    #[serde(default)]
    pub cancel_date: Option<RawInstant>,
    #[serde(default)]
    pub billing_cycle: Option<BillingCycle>,
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl SubscriptionDocument {
    /// `None` when the tenant or plan reference is blank. A missing or
    /// unknown status label is kept as `Unlabelled`.
    pub fn into_record(self, id: SubscriptionId, now: EpochMillis) -> Option<SubscriptionRecord> {
        let status = SubscriptionStatus::from_label(self.status.as_deref());
        let tenant_id = TenantId::new(self.client_id).ok()?;
        let plan_id = PlanId::new(self.plan_id.unwrap_or_default()).ok()?;

        Some(SubscriptionRecord {
            id,
            tenant_id,
            plan_id,
            start_date: self.start_date.map_or(now, |raw| raw.normalize(now)),
            end_date: self.end_date.map_or(now, |raw| raw.normalize(now)),
            status,
            auto_renew: self.auto_renew.unwrap_or(false),
            cancel_date: RawInstant::normalize_optional(self.cancel_date.as_ref(), now),
            billing_cycle: self.billing_cycle,
            price: self.price,
            currency: self.currency,
            notes: self.notes,
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanDocument {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub billing_cycle: Option<BillingCycle>,
}

impl PlanDocument {
    pub fn into_plan(self, id: PlanId) -> SubscriptionPlan {
        SubscriptionPlan {
            id,
            name: self.name.unwrap_or_default(),
            price: self.price.unwrap_or(0.0),
            currency: self.currency.unwrap_or_default(),
            billing_cycle: self.billing_cycle.unwrap_or(BillingCycle::Other),
        }
    }
}

pub fn parse_tenant(id: TenantId, body: JsonValue, now: EpochMillis) -> Result<Tenant, DomainError> {
    let doc: TenantDocument = serde_json::from_value(body).map_err(|e| {
        DomainError::new(
            ErrorCode::SerializationError,
            format!("Malformed tenant document {}: {}", id, e),
        )
    })?;
    Ok(doc.into_tenant(id, now))
}

/// Unusable subscription documents are logged and skipped rather than
/// failing the whole listing.
pub fn parse_subscription(id: &str, body: JsonValue, now: EpochMillis) -> Option<SubscriptionRecord> {
    let subscription_id = SubscriptionId::new(id).ok()?;
    match serde_json::from_value::<SubscriptionDocument>(body) {
        Ok(doc) => {
            let record = doc.into_record(subscription_id, now);
            if record.is_none() {
                tracing::debug!(subscription_id = %id, "skipping subscription with blank references");
            }
            record
        }
        Err(e) => {
            tracing::warn!(subscription_id = %id, error = %e, "skipping malformed subscription document");
            None
        }
    }
}

pub fn parse_plan(id: PlanId, body: JsonValue) -> Result<SubscriptionPlan, DomainError> {
    let doc: PlanDocument = serde_json::from_value(body).map_err(|e| {
        DomainError::new(
            ErrorCode::SerializationError,
            format!("Malformed plan document {}: {}", id, e),
        )
    })?;
    Ok(doc.into_plan(id))
}

/// A malformed config is treated as missing so resolution can fall through
/// to the next scope.
pub fn parse_trial_config(scope: &str, body: JsonValue) -> Option<TrialPeriodsConfig> {
    match serde_json::from_value(body) {
        Ok(config) => Some(config),
        Err(e) => {
            tracing::warn!(scope = %scope, error = %e, "ignoring malformed trial config");
            None
        }
    }
}

/// Sorts records by start date, oldest first.
pub fn order_by_start(records: &mut [SubscriptionRecord]) {
    records.sort_by_key(|r| r.start_date);
}
