//! Subscription plans and how their billing cycle sets a period end.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{EpochMillis, PlanId};

/// Length of the fixed period used for cycles without calendar semantics.
pub const FALLBACK_PERIOD_DAYS: i64 = 30;

/// Billing cycle label carried by a plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BillingCycle {
    Monthly,
    Quarterly,
    Biannually,
    Annually,
    Yearly,
    #[serde(other)]
    Other,
}

impl BillingCycle {
    /// End of a period that starts at `start`.
    ///
    /// Only `monthly` and `yearly` use calendar arithmetic; every other cycle
    /// gets a fixed thirty days.
    pub fn period_end(&self, start: EpochMillis) -> EpochMillis {
        let calendar = match self {
            BillingCycle::Monthly => start.plus_calendar_months(1),
            BillingCycle::Yearly => start.plus_calendar_months(12),
            _ => None,
        };
        calendar.unwrap_or_else(|| start.plus_days(FALLBACK_PERIOD_DAYS))
    }
}

/// A purchasable plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionPlan {
    pub id: PlanId,
    pub name: String,
    #[serde(default)]
    pub price: f64,
    #[serde(default)]
    pub currency: String,
    pub billing_cycle: BillingCycle,
}
