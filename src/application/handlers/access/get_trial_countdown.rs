//! GetTrialCountdownHandler - Remaining trial time for banners.
//!
//! Uses the floored days/hours/minutes breakdown. The days figure inside a
//! resolved status rounds up instead; both are reported so a banner can
//! show either.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::domain::access::{days_remaining_ceil, remaining, AccessError, TrialRemaining};
use crate::domain::foundation::{EpochMillis, TenantId};
use crate::ports::{Clock, TenantRepository};

#[derive(Debug, Clone)]
pub struct GetTrialCountdownQuery {
    pub tenant_id: TenantId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrialCountdown {
    pub trial_end_date: EpochMillis,
    pub remaining: TrialRemaining,
    /// Ceiling of the days left, as reported by the resolver.
    pub days_remaining: i64,
    pub expired: bool,
}

/// `None` when the tenant is unknown, not in trial, or has no end date.
pub type GetTrialCountdownResult = Option<TrialCountdown>;

pub struct GetTrialCountdownHandler {
    tenants: Arc<dyn TenantRepository>,
    clock: Arc<dyn Clock>,
}

impl GetTrialCountdownHandler {
    pub fn new(tenants: Arc<dyn TenantRepository>, clock: Arc<dyn Clock>) -> Self {
        Self { tenants, clock }
    }

    pub async fn handle(&self, query: GetTrialCountdownQuery) -> Result<GetTrialCountdownResult, AccessError> {
        let tenant = self.tenants.find_by_id(&query.tenant_id).await?;
        let now = self.clock.now();

        Ok(tenant
            .filter(|t| t.is_in_trial)
            .and_then(|t| t.trial_end_date)
            .map(|end| TrialCountdown {
                trial_end_date: end,
                remaining: remaining(end, now),
                days_remaining: days_remaining_ceil(end, now).max(0),
                expired: !end.is_after(now),
            }))
    }
}
