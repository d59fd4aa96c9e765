//! In-memory handoff store.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::RwLock;

use crate::domain::access::DenialReason;
use crate::domain::foundation::{DomainError, ErrorCode, SessionId};
use crate::ports::{handoff_key, HandoffStore};

/// Keeps reasons under `<session>:subscription_error`, mirroring the Redis
/// key layout.
#[derive(Default)]
pub struct InMemoryHandoffStore {
    entries: RwLock<HashMap<String, DenialReason>>,
}

impl InMemoryHandoffStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads without clearing.
    pub fn peek(&self, session_id: &SessionId) -> Option<DenialReason> {
        self.entries
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(&handoff_key(session_id))
            .cloned()
    }
}

fn lock_error() -> DomainError {
    DomainError::new(ErrorCode::InternalError, "Handoff lock poisoned")
}

#[async_trait]
impl HandoffStore for InMemoryHandoffStore {
    async fn put(&self, session_id: &SessionId, reason: &DenialReason) -> Result<(), DomainError> {
        self.entries
            .write()
            .map_err(|_| lock_error())?
            .insert(handoff_key(session_id), reason.clone());
        Ok(())
    }

    async fn take(&self, session_id: &SessionId) -> Result<Option<DenialReason>, DomainError> {
        Ok(self
            .entries
            .write()
            .map_err(|_| lock_error())?
            .remove(&handoff_key(session_id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::access::StatusCode;

    fn reason() -> DenialReason {
        DenialReason {
            title: "Trial period ended".to_string(),
            message: "Your trial ended".to_string(),
            status_code: StatusCode::TrialExpired,
        }
    }

    #[test]
    fn key_uses_well_known_suffix() {
        assert_eq!(handoff_key(&SessionId::new("s-1").unwrap()), "s-1:subscription_error");
    }

    #[tokio::test]
    async fn take_reads_once() {
        let store = InMemoryHandoffStore::new();
        let session = SessionId::new("s-1").unwrap();

        store.put(&session, &reason()).await.unwrap();

        assert_eq!(store.take(&session).await.unwrap(), Some(reason()));
        assert_eq!(store.take(&session).await.unwrap(), None);
    }
}
