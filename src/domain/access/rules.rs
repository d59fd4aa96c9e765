//! The ordered status pipeline.
//!
//! Resolution loads one [`AccessSnapshot`] and walks [`STATUS_PIPELINE`]
//! once; the first rule whose predicate holds produces the status. No rule
//! performs I/O, so the same snapshot always yields the same [`Resolution`].

use crate::domain::foundation::EpochMillis;

use super::{days_remaining_ceil, ResolvedStatus, StatusCode, SubscriptionRecord, SubscriptionStatus, Tenant};

/// Trial days reported when a tenant is in trial without a recorded end.
pub const OPEN_TRIAL_DAYS_REMAINING: i64 = 30;

/// Everything the pipeline looks at, loaded once per resolution.
#[derive(Debug, Clone)]
pub struct AccessSnapshot {
    /// `None` when no tenant document exists.
    pub tenant: Option<Tenant>,
    pub subscriptions: Vec<SubscriptionRecord>,
    pub now: EpochMillis,
}

impl AccessSnapshot {
    fn trial_valid(&self) -> bool {
        self.tenant.as_ref().map_or(false, |t| t.trial_valid_at(self.now))
    }

    fn trial_elapsed(&self) -> bool {
        self.tenant.as_ref().map_or(false, |t| t.trial_elapsed_at(self.now))
    }

    /// Latest end date among active records still running.
    fn live_subscription_end(&self) -> Option<EpochMillis> {
        self.subscriptions
            .iter()
            .filter(|s| s.is_live_at(self.now))
            .map(|s| s.end_date)
            .max()
    }

    /// Latest end date among active-labelled records, all of which elapsed.
    fn elapsed_active_end(&self) -> Option<EpochMillis> {
        if self.live_subscription_end().is_some() {
            return None;
        }
        self.subscriptions
            .iter()
            .filter(|s| s.status == SubscriptionStatus::Active)
            .map(|s| s.end_date)
            .max()
    }

    fn latest_cancellation(&self) -> Option<EpochMillis> {
        self.subscriptions
            .iter()
            .filter(|s| s.status == SubscriptionStatus::Cancelled)
            .map(SubscriptionRecord::cancellation_date)
            .max()
    }

    fn latest_expiry(&self) -> Option<EpochMillis> {
        self.subscriptions
            .iter()
            .filter(|s| s.is_expired_at(self.now))
            .map(|s| s.end_date)
            .max()
    }

    fn trial_status(&self) -> ResolvedStatus {
        let days = self
            .tenant
            .as_ref()
            .and_then(|t| t.trial_end_date)
            .map(|end| days_remaining_ceil(end, self.now))
            .unwrap_or(OPEN_TRIAL_DAYS_REMAINING);
        ResolvedStatus::trial_active(days)
    }
}

/// One `(predicate, resolution)` pair of the pipeline.
pub struct StatusRule {
    pub name: &'static str,
    pub applies: fn(&AccessSnapshot) -> bool,
    pub resolve: fn(&AccessSnapshot) -> ResolvedStatus,
}

/// Rules in precedence order. The last one always applies.
///
/// A live paid subscription outranks a still-open trial, so the trial rule
/// steps aside when one exists; otherwise a stale trial flag could never be
/// healed.
pub const STATUS_PIPELINE: [StatusRule; 8] = [
    StatusRule {
        name: "trial_still_valid",
        applies: |s| s.trial_valid() && s.live_subscription_end().is_none(),
        resolve: AccessSnapshot::trial_status,
    },
    StatusRule {
        name: "active_subscription",
        applies: |s| s.live_subscription_end().is_some(),
        resolve: |s| ResolvedStatus::active_subscription(s.live_subscription_end().unwrap_or(s.now)),
    },
    StatusRule {
        name: "active_records_elapsed",
        applies: |s| s.elapsed_active_end().is_some(),
        resolve: |s| ResolvedStatus::subscription_expired(s.elapsed_active_end().unwrap_or(s.now)),
    },
    StatusRule {
        name: "trial_expired",
        applies: AccessSnapshot::trial_elapsed,
        resolve: |s| ResolvedStatus::trial_expired(s.tenant.as_ref().and_then(|t| t.trial_end_date)),
    },
    StatusRule {
        name: "cancelled_record",
        applies: |s| s.latest_cancellation().is_some(),
        resolve: |s| ResolvedStatus::subscription_cancelled(s.latest_cancellation().unwrap_or(s.now)),
    },
    StatusRule {
        name: "expired_record",
        applies: |s| s.latest_expiry().is_some(),
        resolve: |s| ResolvedStatus::subscription_expired(s.latest_expiry().unwrap_or(s.now)),
    },
    StatusRule {
        name: "trial_recheck",
        applies: AccessSnapshot::trial_valid,
        resolve: AccessSnapshot::trial_status,
    },
    StatusRule {
        name: "no_subscription",
        applies: |_| true,
        resolve: |_| ResolvedStatus::no_subscription(),
    },
];

/// Outcome of one pipeline walk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub status: ResolvedStatus,
    /// Name of the rule that matched.
    pub rule: &'static str,
    /// The stored trial flag contradicts a paid status and should be cleared.
    pub heal_trial_flag: bool,
}

pub fn evaluate(snapshot: &AccessSnapshot) -> Resolution {
    let (rule, status) = STATUS_PIPELINE
        .iter()
        .find(|rule| (rule.applies)(snapshot))
        .map(|rule| (rule.name, (rule.resolve)(snapshot)))
        .unwrap_or_else(|| ("no_subscription", ResolvedStatus::no_subscription()));

    let heal_trial_flag = status.status_code == StatusCode::ActiveSubscription
        && snapshot.tenant.as_ref().map_or(false, |t| t.is_in_trial);

    Resolution {
        status,
        rule,
        heal_trial_flag,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::access::STATUS_ACTIVE;
    use crate::domain::foundation::{PlanId, SubscriptionId, TenantId, MILLIS_PER_DAY};

    const NOW: EpochMillis = EpochMillis::new(1_705_276_800_000);

    fn tenant(is_in_trial: bool, end_in_days: Option<f64>) -> Tenant {
        Tenant {
            id: TenantId::new("biz-1").unwrap(),
            business_name: None,
            email: None,
            is_in_trial,
            trial_start_date: Some(NOW.plus_days(-10)),
            trial_end_date: end_in_days.map(|d| NOW.plus_millis((d * MILLIS_PER_DAY as f64) as i64)),
            status: STATUS_ACTIVE.to_string(),
            created_at: NOW.plus_days(-10),
            trial_info: None,
            trial_expired_at: None,
            subscription_plan_id: None,
            subscription_start_date: None,
        }
    }

    fn sub(status: SubscriptionStatus, end_in_days: i64) -> SubscriptionRecord {
        SubscriptionRecord {
            id: SubscriptionId::generate(),
            tenant_id: TenantId::new("biz-1").unwrap(),
            plan_id: PlanId::new("plan-1").unwrap(),
            start_date: NOW.plus_days(-40),
            end_date: NOW.plus_days(end_in_days),
            status,
            auto_renew: false,
            cancel_date: None,
            billing_cycle: None,
            price: None,
            currency: None,
            notes: None,
        }
    }

    fn resolve(tenant: Option<Tenant>, subscriptions: Vec<SubscriptionRecord>) -> Resolution {
        evaluate(&AccessSnapshot {
            tenant,
            subscriptions,
            now: NOW,
        })
    }

    #[test]
    fn valid_trial_reports_ceiling_days() {
        let r = resolve(Some(tenant(true, Some(4.2))), vec![]);
        assert_eq!(r.rule, "trial_still_valid");
        assert_eq!(r.status.status_code, StatusCode::TrialActive);
        assert_eq!(r.status.trial_days_remaining, Some(5));
        assert!(!r.heal_trial_flag);
    }

    #[test]
    fn open_ended_trial_reports_thirty_days() {
        let r = resolve(Some(tenant(true, None)), vec![]);
        assert_eq!(r.status.trial_days_remaining, Some(OPEN_TRIAL_DAYS_REMAINING));
    }

    #[test]
    fn live_subscription_beats_stale_trial_flag_and_requests_heal() {
        let r = resolve(
            Some(tenant(true, Some(5.0))),
            vec![sub(SubscriptionStatus::Active, 20)],
        );
        assert_eq!(r.status.status_code, StatusCode::ActiveSubscription);
        assert!(r.heal_trial_flag);
    }

    #[test]
    fn latest_live_end_date_is_reported() {
        let r = resolve(
            Some(tenant(false, None)),
            vec![
                sub(SubscriptionStatus::Active, 10),
                sub(SubscriptionStatus::Active, 40),
                sub(SubscriptionStatus::Active, -5),
            ],
        );
        assert_eq!(r.status.subscription_end_date, Some(NOW.plus_days(40)));
        assert!(!r.heal_trial_flag);
    }

    #[test]
    fn elapsed_active_records_are_expired_with_latest_date() {
        let r = resolve(
            Some(tenant(false, None)),
            vec![sub(SubscriptionStatus::Active, -30), sub(SubscriptionStatus::Active, -3)],
        );
        assert_eq!(r.rule, "active_records_elapsed");
        assert_eq!(r.status.status_code, StatusCode::SubscriptionExpired);
        assert_eq!(r.status.subscription_end_date, Some(NOW.plus_days(-3)));
    }

    #[test]
    fn elapsed_trial_without_records_is_trial_expired() {
        let r = resolve(Some(tenant(true, Some(-1.0))), vec![]);
        assert_eq!(r.status.status_code, StatusCode::TrialExpired);
        assert!(r.status.trial_expired);
    }

    #[test]
    fn cancellation_outranks_date_expiry() {
        let r = resolve(
            Some(tenant(false, None)),
            vec![sub(SubscriptionStatus::Pending, -2), sub(SubscriptionStatus::Cancelled, 15)],
        );
        assert_eq!(r.status.status_code, StatusCode::SubscriptionCancelled);
    }

    #[test]
    fn unlabelled_past_record_is_subscription_expired() {
        let r = resolve(Some(tenant(false, None)), vec![sub(SubscriptionStatus::Unlabelled, -60)]);
        assert_eq!(r.rule, "expired_record");
        assert_eq!(r.status.status_code, StatusCode::SubscriptionExpired);
        assert_eq!(r.status.subscription_end_date, Some(NOW.plus_days(-60)));
    }

    #[test]
    fn cancellation_outranks_unlabelled_past_record() {
        let r = resolve(
            Some(tenant(false, None)),
            vec![sub(SubscriptionStatus::Unlabelled, -60), sub(SubscriptionStatus::Cancelled, -1)],
        );
        assert_eq!(r.rule, "cancelled_record");
        assert_eq!(r.status.status_code, StatusCode::SubscriptionCancelled);
    }

    #[test]
    fn elapsed_active_record_outranks_cancellation() {
        let r = resolve(
            Some(tenant(false, None)),
            vec![sub(SubscriptionStatus::Active, -60), sub(SubscriptionStatus::Cancelled, -1)],
        );
        assert_eq!(r.rule, "active_records_elapsed");
        assert_eq!(r.status.status_code, StatusCode::SubscriptionExpired);
    }

    #[test]
    fn explicit_expired_record_is_subscription_expired() {
        let r = resolve(Some(tenant(false, None)), vec![sub(SubscriptionStatus::Expired, 3)]);
        assert_eq!(r.rule, "expired_record");
        assert_eq!(r.status.status_code, StatusCode::SubscriptionExpired);
    }

    #[test]
    fn pending_future_record_is_not_access() {
        let r = resolve(Some(tenant(false, None)), vec![sub(SubscriptionStatus::Pending, 30)]);
        assert_eq!(r.status.status_code, StatusCode::NoSubscription);
    }

    #[test]
    fn missing_tenant_without_records_is_no_subscription() {
        let r = resolve(None, vec![]);
        assert_eq!(r.status.status_code, StatusCode::NoSubscription);
        assert!(!r.heal_trial_flag);
    }

    #[test]
    fn missing_tenant_still_sees_live_subscription() {
        let r = resolve(None, vec![sub(SubscriptionStatus::Active, 3)]);
        assert_eq!(r.status.status_code, StatusCode::ActiveSubscription);
        assert!(!r.heal_trial_flag);
    }

    #[test]
    fn evaluation_is_deterministic() {
        let snapshot = AccessSnapshot {
            tenant: Some(tenant(true, Some(2.5))),
            subscriptions: vec![sub(SubscriptionStatus::Cancelled, -1)],
            now: NOW,
        };
        assert_eq!(evaluate(&snapshot), evaluate(&snapshot));
    }

    #[test]
    fn pipeline_ends_with_catch_all() {
        let last = STATUS_PIPELINE.last().map(|r| r.name);
        assert_eq!(last, Some("no_subscription"));
        assert_eq!(STATUS_PIPELINE.len(), 8);
    }
}
