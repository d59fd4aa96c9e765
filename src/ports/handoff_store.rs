//! Handoff store port.
//!
//! Carries a [`DenialReason`] across the sign-out redirect. The guard writes
//! it under the well-known key before terminating the session; the landing
//! page reads it exactly once.

use async_trait::async_trait;

use crate::domain::access::DenialReason;
use crate::domain::foundation::{DomainError, SessionId};

/// Well-known key the denial reason is stored under.
pub const HANDOFF_KEY: &str = "subscription_error";

/// Storage key for one session: `<session>:subscription_error`.
pub fn handoff_key(session_id: &SessionId) -> String {
    format!("{}:{}", session_id, HANDOFF_KEY)
}

#[async_trait]
pub trait HandoffStore: Send + Sync {
    /// Store the reason for this session, replacing any earlier one.
    async fn put(&self, session_id: &SessionId, reason: &DenialReason) -> Result<(), DomainError>;

    /// Read and clear the reason in one step.
    async fn take(&self, session_id: &SessionId) -> Result<Option<DenialReason>, DomainError>;
}
