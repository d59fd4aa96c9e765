//! Identity provider port.
//!
//! The engine needs exactly three capabilities from the identity system:
//! look up the current session, hear about session changes, and terminate
//! a session. Credentials never pass through here.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::domain::foundation::{DomainError, EpochMillis, SessionId, TenantId};

/// An authenticated session bound to a tenant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentitySession {
    pub session_id: SessionId,
    pub tenant_id: TenantId,
    pub started_at: EpochMillis,
}

/// Notification pushed by the provider when the session state changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionChange {
    SignedIn(IdentitySession),
    SignedOut(SessionId),
}

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// The session currently signed in, if any.
    async fn current_session(&self) -> Result<Option<IdentitySession>, DomainError>;

    /// Subscribe to session changes.
    ///
    /// Receivers that lag lose the oldest changes; watchers should fall back
    /// to `current_session` after a lag.
    fn subscribe(&self) -> broadcast::Receiver<SessionChange>;

    /// Terminate the given session.
    ///
    /// Terminating a session that no longer exists is not an error.
    async fn terminate(&self, session_id: &SessionId) -> Result<(), DomainError>;
}
