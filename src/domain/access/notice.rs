//! Deciding which trial notice, if any, a sweep should raise.
//!
//! Delivery is someone else's job. This module only answers "that" and
//! "what".

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{EpochMillis, TenantId};

use super::{days_remaining_ceil, remaining, TrialRemaining};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrialNoticeKind {
    /// Trial ends within the wide window but not the final one.
    ClosingSoon,
    /// Trial ends within the final window.
    Final,
    /// Trial already ended.
    Expired,
}

/// Notice thresholds, in days before the trial end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NoticeWindows {
    pub closing_soon_days: u32,
    pub final_days: u32,
}

impl Default for NoticeWindows {
    fn default() -> Self {
        Self {
            closing_soon_days: 3,
            final_days: 1,
        }
    }
}

impl NoticeWindows {
    /// Which notice a trial ending at `end` warrants at `now`.
    ///
    /// The windows are disjoint: `[now, now+final]` is final,
    /// `(now+final, now+closing]` is closing-soon. A trial ending exactly now
    /// has not expired yet, so it gets the final notice.
    pub fn classify(&self, end: EpochMillis, now: EpochMillis) -> Option<TrialNoticeKind> {
        if end.is_before(now) {
            return Some(TrialNoticeKind::Expired);
        }
        let final_edge = now.plus_days(self.final_days as i64);
        let closing_edge = now.plus_days(self.closing_soon_days as i64);
        if !end.is_after(final_edge) {
            Some(TrialNoticeKind::Final)
        } else if !end.is_after(closing_edge) {
            Some(TrialNoticeKind::ClosingSoon)
        } else {
            None
        }
    }
}

/// A decided notice, handed to the notifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrialNotice {
    pub tenant_id: TenantId,
    pub kind: TrialNoticeKind,
    pub trial_end_date: EpochMillis,
    pub days_remaining: i64,
    pub remaining: TrialRemaining,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl TrialNotice {
    pub fn new(
        tenant_id: TenantId,
        kind: TrialNoticeKind,
        trial_end_date: EpochMillis,
        now: EpochMillis,
        email: Option<String>,
    ) -> Self {
        Self {
            tenant_id,
            kind,
            trial_end_date,
            days_remaining: days_remaining_ceil(trial_end_date, now).max(0),
            remaining: remaining(trial_end_date, now),
            email,
        }
    }
}
