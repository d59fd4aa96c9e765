//! Audit events emitted by trial lifecycle operations.
//!
//! Events are named in past tense and carry enough context to reconstruct
//! why a tenant's trial window is what it is.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{
    domain_event, EpochMillis, EventId, PlanId, SubscriptionId, TenantId,
};

use super::TrialProvenance;

/// A tenant was onboarded with a trial.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrialStarted {
    pub event_id: EventId,
    pub tenant_id: TenantId,
    pub trial_start_date: EpochMillis,
    pub trial_end_date: EpochMillis,
    pub provenance: TrialProvenance,
    pub occurred_at: EpochMillis,
}

domain_event!(
    TrialStarted,
    event_type = "tenant.trial_started.v1",
    schema_version = 1,
    aggregate_id = tenant_id,
    aggregate_type = "Tenant",
    occurred_at = occurred_at,
    event_id = event_id
);

/// A trial window was pushed back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrialExtended {
    pub event_id: EventId,
    pub tenant_id: TenantId,
    pub previous_end_date: Option<EpochMillis>,
    pub new_end_date: EpochMillis,
    pub additional_days: u32,
    pub additional_minutes: u32,
    pub occurred_at: EpochMillis,
}

domain_event!(
    TrialExtended,
    event_type = "tenant.trial_extended.v1",
    schema_version = 1,
    aggregate_id = tenant_id,
    aggregate_type = "Tenant",
    occurred_at = occurred_at,
    event_id = event_id
);

/// A trial was converted into a paid subscription.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrialConverted {
    pub event_id: EventId,
    pub tenant_id: TenantId,
    pub subscription_id: SubscriptionId,
    pub plan_id: PlanId,
    pub start_date: EpochMillis,
    pub end_date: EpochMillis,
    pub occurred_at: EpochMillis,
}

domain_event!(
    TrialConverted,
    event_type = "tenant.trial_converted.v1",
    schema_version = 1,
    aggregate_id = tenant_id,
    aggregate_type = "Tenant",
    occurred_at = occurred_at,
    event_id = event_id
);

/// The sweep deactivated a tenant whose trial ended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrialExpired {
    pub event_id: EventId,
    pub tenant_id: TenantId,
    pub trial_end_date: EpochMillis,
    pub occurred_at: EpochMillis,
}

domain_event!(
    TrialExpired,
    event_type = "tenant.trial_expired.v1",
    schema_version = 1,
    aggregate_id = tenant_id,
    aggregate_type = "Tenant",
    occurred_at = occurred_at,
    event_id = event_id
);
