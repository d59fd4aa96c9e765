//! Trial notifier port.
//!
//! The sweep decides that a notice is due and what it says; delivery and
//! the "already notified" bookkeeping belong to the implementation.

use async_trait::async_trait;

use crate::domain::access::TrialNotice;
use crate::domain::foundation::DomainError;

#[async_trait]
pub trait TrialNotifier: Send + Sync {
    /// Hand over a decided notice.
    ///
    /// Returns `false` when the implementation already delivered the same
    /// notice (same tenant, kind and trial end) and skipped it.
    async fn notify(&self, notice: &TrialNotice) -> Result<bool, DomainError>;
}
