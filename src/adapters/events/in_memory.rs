//! In-memory event bus for tests and local runs.
//!
//! Captures every published envelope for assertions. Can be told to fail
//! publishes so callers' "log and continue" paths are observable.

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::RwLock;

use crate::domain::foundation::{DomainError, ErrorCode, EventEnvelope};
use crate::ports::EventPublisher;

/// In-memory event bus.
///
/// # Example
///
/// ```ignore
/// let bus = Arc::new(InMemoryEventBus::new());
/// handler.handle(cmd).await?;
/// assert!(bus.has_event("tenant.trial_started.v1"));
/// ```
pub struct InMemoryEventBus {
    published: RwLock<Vec<EventEnvelope>>,
    fail_publishes: AtomicBool,
}

impl InMemoryEventBus {
    pub fn new() -> Self {
        Self {
            published: RwLock::new(Vec::new()),
            fail_publishes: AtomicBool::new(false),
        }
    }

    // === Test Helpers ===

    /// Makes every subsequent publish return an error.
    pub fn set_failing(&self, failing: bool) {
        self.fail_publishes.store(failing, Ordering::SeqCst);
    }

    pub fn published_events(&self) -> Vec<EventEnvelope> {
        self.published
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn events_of_type(&self, event_type: &str) -> Vec<EventEnvelope> {
        self.published_events()
            .into_iter()
            .filter(|e| e.event_type == event_type)
            .collect()
    }

    pub fn event_count(&self) -> usize {
        self.published
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    pub fn has_event(&self, event_type: &str) -> bool {
        self.published
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .iter()
            .any(|e| e.event_type == event_type)
    }
}

impl Default for InMemoryEventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EventPublisher for InMemoryEventBus {
    async fn publish(&self, event: EventEnvelope) -> Result<(), DomainError> {
        if self.fail_publishes.load(Ordering::SeqCst) {
            return Err(DomainError::new(
                ErrorCode::InternalError,
                format!("Event bus rejected {}", event.event_type),
            ));
        }

        self.published
            .write()
            .map_err(|_| DomainError::new(ErrorCode::InternalError, "Event bus lock poisoned"))?
            .push(event);
        Ok(())
    }

    async fn publish_all(&self, events: Vec<EventEnvelope>) -> Result<(), DomainError> {
        for event in events {
            self.publish(event).await?;
        }
        Ok(())
    }
}
