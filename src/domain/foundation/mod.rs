//! Foundation module - Shared domain primitives.
//!
//! Contains identifiers, the canonical instant type, error types and the
//! event envelope that form the vocabulary of the access engine.

mod errors;
mod events;
mod ids;
mod timestamp;

pub use errors::{DomainError, ErrorCode, ValidationError};
pub use events::{DomainEvent, EventEnvelope, EventId, EventMetadata, SerializableDomainEvent};
pub use crate::domain_event;
pub use ids::{PlanId, ScopeId, SessionId, SubscriptionId, TenantId};
pub use timestamp::{
    EpochMillis, RawInstant, StoreTimestamp, MILLIS_PER_DAY, MILLIS_PER_HOUR, MILLIS_PER_MINUTE,
};
