//! Tenant entity and the merge patches written against it.
//!
//! A tenant is never rewritten as a whole by this engine. Every mutation is a
//! single field-level merge ([`TenantPatch`]) so concurrent writers cannot
//! clobber each other's fields, and the self-heal correction stays idempotent.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{EpochMillis, PlanId, TenantId};

use super::TrialProvenance;

/// Lifecycle label for a tenant that may use the application.
pub const STATUS_ACTIVE: &str = "active";

/// Lifecycle label written when a trial lapses without conversion.
pub const STATUS_INACTIVE: &str = "inactive";

/// A business account, with every stored instant already normalized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tenant {
    pub id: TenantId,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub business_name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    pub is_in_trial: bool,

    pub trial_start_date: Option<EpochMillis>,

    pub trial_end_date: Option<EpochMillis>,

    /// Free-text lifecycle label ("active", "inactive", ...).
    pub status: String,

    pub created_at: EpochMillis,

    /// Which trial definition produced the current trial window.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trial_info: Option<TrialProvenance>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub trial_expired_at: Option<EpochMillis>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub subscription_plan_id: Option<PlanId>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub subscription_start_date: Option<EpochMillis>,
}

impl Tenant {
    /// Builds a freshly onboarded tenant whose trial runs from `start` to `end`.
    pub fn start_trial(
        id: TenantId,
        draft: TenantDraft,
        start: EpochMillis,
        end: EpochMillis,
        provenance: TrialProvenance,
    ) -> Self {
        Self {
            id,
            business_name: draft.business_name,
            email: draft.email,
            is_in_trial: true,
            trial_start_date: Some(start),
            trial_end_date: Some(end),
            status: STATUS_ACTIVE.to_string(),
            created_at: start,
            trial_info: Some(provenance),
            trial_expired_at: None,
            subscription_plan_id: None,
            subscription_start_date: None,
        }
    }

    /// Trial flag set and the window has not closed. A missing end date
    /// counts as still open.
    pub fn trial_valid_at(&self, now: EpochMillis) -> bool {
        self.is_in_trial && self.trial_end_date.map_or(true, |end| end.is_after(now))
    }

    /// Trial flag set but the recorded end date has passed.
    pub fn trial_elapsed_at(&self, now: EpochMillis) -> bool {
        self.is_in_trial && self.trial_end_date.map_or(false, |end| !end.is_after(now))
    }
}

/// Caller-supplied fields for a tenant being onboarded.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TenantDraft {
    /// Use this id instead of generating one (e.g. the identity provider's uid).
    #[serde(default)]
    pub id: Option<TenantId>,

    #[serde(default)]
    pub business_name: Option<String>,

    #[serde(default)]
    pub email: Option<String>,
}

/// Field-level merge write against a stored tenant.
///
/// Absent fields are left untouched by the store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TenantPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_in_trial: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub trial_end_date: Option<EpochMillis>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub trial_expired_at: Option<EpochMillis>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub trial_info: Option<TrialProvenance>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub subscription_plan_id: Option<PlanId>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub subscription_start_date: Option<EpochMillis>,
}

impl TenantPatch {
    /// Self-heal correction: clears the trial flag and nothing else.
    ///
    /// Unconditional, so racing resolvers issuing it twice converge.
    pub fn end_trial() -> Self {
        Self {
            is_in_trial: Some(false),
            ..Default::default()
        }
    }

    pub fn extend_trial(new_end: EpochMillis) -> Self {
        Self {
            is_in_trial: Some(true),
            status: Some(STATUS_ACTIVE.to_string()),
            trial_end_date: Some(new_end),
            ..Default::default()
        }
    }

    pub fn converted(plan_id: PlanId, started_at: EpochMillis) -> Self {
        Self {
            is_in_trial: Some(false),
            status: Some(STATUS_ACTIVE.to_string()),
            subscription_plan_id: Some(plan_id),
            subscription_start_date: Some(started_at),
            ..Default::default()
        }
    }

    pub fn trial_lapsed(at: EpochMillis) -> Self {
        Self {
            is_in_trial: Some(false),
            status: Some(STATUS_INACTIVE.to_string()),
            trial_expired_at: Some(at),
            ..Default::default()
        }
    }

    pub fn reapplied(new_end: EpochMillis, provenance: TrialProvenance) -> Self {
        Self {
            trial_end_date: Some(new_end),
            trial_info: Some(provenance),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Applies the merge to an in-memory tenant.
    pub fn apply_to(&self, tenant: &mut Tenant) {
        if let Some(flag) = self.is_in_trial {
            tenant.is_in_trial = flag;
        }
        if let Some(status) = &self.status {
            tenant.status = status.clone();
        }
        if let Some(end) = self.trial_end_date {
            tenant.trial_end_date = Some(end);
        }
        if let Some(at) = self.trial_expired_at {
            tenant.trial_expired_at = Some(at);
        }
        if let Some(info) = &self.trial_info {
            tenant.trial_info = Some(info.clone());
        }
        if let Some(plan) = &self.subscription_plan_id {
            tenant.subscription_plan_id = Some(plan.clone());
        }
        if let Some(start) = self.subscription_start_date {
            tenant.subscription_start_date = Some(start);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::access::ConfigSource;

    fn tenant(is_in_trial: bool, end: Option<i64>) -> Tenant {
        Tenant {
            id: TenantId::new("biz-1").unwrap(),
            business_name: None,
            email: None,
            is_in_trial,
            trial_start_date: Some(EpochMillis::new(0)),
            trial_end_date: end.map(EpochMillis::new),
            status: STATUS_ACTIVE.to_string(),
            created_at: EpochMillis::new(0),
            trial_info: None,
            trial_expired_at: None,
            subscription_plan_id: None,
            subscription_start_date: None,
        }
    }

    #[test]
    fn trial_without_end_date_is_still_valid() {
        let t = tenant(true, None);
        assert!(t.trial_valid_at(EpochMillis::new(10)));
        assert!(!t.trial_elapsed_at(EpochMillis::new(10)));
    }

    #[test]
    fn trial_ending_exactly_now_has_elapsed() {
        let t = tenant(true, Some(100));
        assert!(!t.trial_valid_at(EpochMillis::new(100)));
        assert!(t.trial_elapsed_at(EpochMillis::new(100)));
    }

    #[test]
    fn trial_flag_off_is_neither_valid_nor_elapsed() {
        let t = tenant(false, Some(100));
        assert!(!t.trial_valid_at(EpochMillis::new(0)));
        assert!(!t.trial_elapsed_at(EpochMillis::new(500)));
    }

    #[test]
    fn end_trial_patch_only_touches_flag() {
        let json = serde_json::to_value(TenantPatch::end_trial()).unwrap();
        assert_eq!(json, serde_json::json!({"isInTrial": false}));
    }

    #[test]
    fn applying_end_trial_twice_is_idempotent() {
        let mut t = tenant(true, Some(100));
        TenantPatch::end_trial().apply_to(&mut t);
        let once = t.clone();
        TenantPatch::end_trial().apply_to(&mut t);
        assert_eq!(t, once);
        assert!(!t.is_in_trial);
    }

    #[test]
    fn extend_patch_reactivates_trial() {
        let mut t = tenant(false, Some(100));
        t.status = STATUS_INACTIVE.to_string();

        TenantPatch::extend_trial(EpochMillis::new(900)).apply_to(&mut t);

        assert!(t.is_in_trial);
        assert_eq!(t.status, STATUS_ACTIVE);
        assert_eq!(t.trial_end_date, Some(EpochMillis::new(900)));
    }

    #[test]
    fn lapsed_patch_records_expiry() {
        let mut t = tenant(true, Some(100));
        TenantPatch::trial_lapsed(EpochMillis::new(200)).apply_to(&mut t);

        assert!(!t.is_in_trial);
        assert_eq!(t.status, STATUS_INACTIVE);
        assert_eq!(t.trial_expired_at, Some(EpochMillis::new(200)));
    }

    #[test]
    fn start_trial_stamps_window_and_provenance() {
        let provenance = TrialProvenance::builtin_default(EpochMillis::new(5));
        let t = Tenant::start_trial(
            TenantId::new("biz-9").unwrap(),
            TenantDraft {
                business_name: Some("Corner Shop".to_string()),
                ..Default::default()
            },
            EpochMillis::new(5),
            EpochMillis::new(50),
            provenance,
        );

        assert!(t.is_in_trial);
        assert_eq!(t.trial_start_date, Some(EpochMillis::new(5)));
        assert_eq!(t.trial_end_date, Some(EpochMillis::new(50)));
        assert_eq!(t.business_name.as_deref(), Some("Corner Shop"));
        assert_eq!(t.trial_info.map(|i| i.source), Some(ConfigSource::BuiltInDefault));
    }

    #[test]
    fn default_patch_is_empty() {
        assert!(TenantPatch::default().is_empty());
        assert!(!TenantPatch::end_trial().is_empty());
    }
}
