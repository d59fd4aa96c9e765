//! Notifier that records notices instead of delivering them.

use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Mutex;

use crate::domain::access::{TrialNotice, TrialNoticeKind};
use crate::domain::foundation::{DomainError, EpochMillis, ErrorCode, TenantId};
use crate::ports::TrialNotifier;

/// Keeps every delivered notice and skips repeats of the same
/// (tenant, kind, trial end).
#[derive(Default)]
pub struct RecordingTrialNotifier {
    delivered: Mutex<Vec<TrialNotice>>,
    seen: Mutex<HashSet<(TenantId, TrialNoticeKind, EpochMillis)>>,
}

impl RecordingTrialNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn delivered(&self) -> Vec<TrialNotice> {
        self.delivered
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn delivered_to(&self, tenant_id: &TenantId) -> Vec<TrialNoticeKind> {
        self.delivered()
            .into_iter()
            .filter(|n| &n.tenant_id == tenant_id)
            .map(|n| n.kind)
            .collect()
    }
}

#[async_trait]
impl TrialNotifier for RecordingTrialNotifier {
    async fn notify(&self, notice: &TrialNotice) -> Result<bool, DomainError> {
        let lock_error = || DomainError::new(ErrorCode::NotificationError, "Notifier lock poisoned");

        let first_time = self
            .seen
            .lock()
            .map_err(|_| lock_error())?
            .insert((notice.tenant_id.clone(), notice.kind, notice.trial_end_date));
        if !first_time {
            return Ok(false);
        }

        self.delivered
            .lock()
            .map_err(|_| lock_error())?
            .push(notice.clone());
        Ok(true)
    }
}
