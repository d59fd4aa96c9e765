//! EventPublisher port - Interface for publishing domain events.
//!
//! Lifecycle handlers publish audit events through this port without knowing
//! whether they end up in memory or in the audit table.

use async_trait::async_trait;

use crate::domain::foundation::{DomainError, EventEnvelope};

/// Port for publishing domain events.
///
/// Implementations must ensure:
/// - Events are delivered at-least-once (consumers may receive duplicates)
/// - Errors are propagated to the caller
#[async_trait]
pub trait EventPublisher: Send + Sync {
    async fn publish(&self, event: EventEnvelope) -> Result<(), DomainError>;

    /// Publish multiple events in order.
    ///
    /// Adapters without batch support publish sequentially and stop at the
    /// first failure.
    async fn publish_all(&self, events: Vec<EventEnvelope>) -> Result<(), DomainError>;
}
