//! In-memory identity provider.
//!
//! Holds at most one current session, like a browser tab does, and
//! broadcasts every change to subscribers.

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::RwLock;
use tokio::sync::broadcast;

use crate::domain::foundation::{DomainError, ErrorCode, SessionId};
use crate::ports::{IdentityProvider, IdentitySession, SessionChange};

const CHANGE_CHANNEL_CAPACITY: usize = 64;

pub struct InMemoryIdentityProvider {
    current: RwLock<Option<IdentitySession>>,
    terminated: RwLock<Vec<SessionId>>,
    changes: broadcast::Sender<SessionChange>,
    failing: AtomicBool,
}

impl InMemoryIdentityProvider {
    pub fn new() -> Self {
        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Self {
            current: RwLock::new(None),
            terminated: RwLock::new(Vec::new()),
            changes,
            failing: AtomicBool::new(false),
        }
    }

    /// Signs a session in and notifies subscribers.
    pub fn sign_in(&self, session: IdentitySession) {
        *self
            .current
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(session.clone());
        // No subscribers is fine.
        let _ = self.changes.send(SessionChange::SignedIn(session));
    }

    /// Sessions terminated through the port, in order.
    pub fn terminated_sessions(&self) -> Vec<SessionId> {
        self.terminated
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Makes `current_session` and `terminate` fail.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    fn ensure_reachable(&self) -> Result<(), DomainError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(DomainError::new(
                ErrorCode::IdentityProviderError,
                "Identity provider unreachable",
            ));
        }
        Ok(())
    }
}

impl Default for InMemoryIdentityProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl IdentityProvider for InMemoryIdentityProvider {
    async fn current_session(&self) -> Result<Option<IdentitySession>, DomainError> {
        self.ensure_reachable()?;
        Ok(self
            .current
            .read()
            .map_err(|_| DomainError::new(ErrorCode::InternalError, "Identity lock poisoned"))?
            .clone())
    }

    fn subscribe(&self) -> broadcast::Receiver<SessionChange> {
        self.changes.subscribe()
    }

    async fn terminate(&self, session_id: &SessionId) -> Result<(), DomainError> {
        self.ensure_reachable()?;
        let was_current = {
            let mut current = self
                .current
                .write()
                .map_err(|_| DomainError::new(ErrorCode::InternalError, "Identity lock poisoned"))?;
            match current.as_ref() {
                Some(session) if &session.session_id == session_id => {
                    *current = None;
                    true
                }
                _ => false,
            }
        };

        self.terminated
            .write()
            .map_err(|_| DomainError::new(ErrorCode::InternalError, "Identity lock poisoned"))?
            .push(session_id.clone());

        if was_current {
            let _ = self.changes.send(SessionChange::SignedOut(session_id.clone()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::{EpochMillis, TenantId};

    fn session(id: &str) -> IdentitySession {
        IdentitySession {
            session_id: SessionId::new(id).unwrap(),
            tenant_id: TenantId::new("biz-1").unwrap(),
            started_at: EpochMillis::new(0),
        }
    }

    #[tokio::test]
    async fn sign_in_is_broadcast_and_current() {
        let provider = InMemoryIdentityProvider::new();
        let mut changes = provider.subscribe();

        provider.sign_in(session("s-1"));

        assert_eq!(changes.recv().await.unwrap(), SessionChange::SignedIn(session("s-1")));
        assert_eq!(provider.current_session().await.unwrap(), Some(session("s-1")));
    }

    #[tokio::test]
    async fn terminate_clears_current_and_broadcasts_sign_out() {
        let provider = InMemoryIdentityProvider::new();
        provider.sign_in(session("s-1"));
        let mut changes = provider.subscribe();

        provider.terminate(&SessionId::new("s-1").unwrap()).await.unwrap();

        assert_eq!(provider.current_session().await.unwrap(), None);
        assert_eq!(
            changes.recv().await.unwrap(),
            SessionChange::SignedOut(SessionId::new("s-1").unwrap())
        );
        assert_eq!(provider.terminated_sessions().len(), 1);
    }

    #[tokio::test]
    async fn terminating_unknown_session_is_not_an_error() {
        let provider = InMemoryIdentityProvider::new();
        provider.terminate(&SessionId::new("gone").unwrap()).await.unwrap();
        assert_eq!(provider.terminated_sessions().len(), 1);
    }
}
