//! Notifier that only logs decided notices.
//!
//! Delivery (email, SMS) is handled by a separate service that tails these
//! log lines; this adapter keeps no "already notified" state.

use async_trait::async_trait;

use crate::domain::access::{TrialNotice, TrialNoticeKind};
use crate::domain::foundation::DomainError;
use crate::ports::TrialNotifier;

#[derive(Debug, Clone, Copy, Default)]
pub struct TracingTrialNotifier;

#[async_trait]
impl TrialNotifier for TracingTrialNotifier {
    async fn notify(&self, notice: &TrialNotice) -> Result<bool, DomainError> {
        let kind = match notice.kind {
            TrialNoticeKind::ClosingSoon => "closing_soon",
            TrialNoticeKind::Final => "final",
            TrialNoticeKind::Expired => "expired",
        };
        tracing::info!(
            tenant_id = %notice.tenant_id,
            kind,
            trial_end_date = %notice.trial_end_date,
            days_remaining = notice.days_remaining,
            has_email = notice.email.is_some(),
            "trial notice decided"
        );
        Ok(true)
    }
}
