//! Event infrastructure for the audit trail of lifecycle operations.
//!
//! - `EventId` - Unique identifier for events (deduplication)
//! - `EventMetadata` - Correlation context
//! - `EventEnvelope` - Transport wrapper handed to `EventPublisher`
//! - `DomainEvent` - Trait that all domain events implement
//! - `domain_event!` - Macro to implement `DomainEvent` for a struct

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::fmt;
use uuid::Uuid;

use super::EpochMillis;

/// Trait that all domain events must implement.
pub trait DomainEvent: Send + Sync {
    /// Event type string with version suffix (e.g., "tenant.trial_started.v1").
    fn event_type(&self) -> &'static str;

    /// MUST match the version suffix in `event_type`.
    fn schema_version(&self) -> u32;

    fn aggregate_id(&self) -> String;

    fn aggregate_type(&self) -> &'static str;

    fn occurred_at(&self) -> EpochMillis;

    fn event_id(&self) -> EventId;
}

/// Provides `to_envelope()` for any serializable domain event.
pub trait SerializableDomainEvent: DomainEvent + Serialize {
    fn to_envelope(&self) -> EventEnvelope {
        EventEnvelope::from_event(self)
    }
}

impl<T: DomainEvent + Serialize> SerializableDomainEvent for T {}

/// Implements `DomainEvent` for a struct by naming its fields.
///
/// ```ignore
/// domain_event!(
///     TrialExtended,
///     event_type = "tenant.trial_extended.v1",
///     schema_version = 1,
///     aggregate_id = tenant_id,
///     aggregate_type = "Tenant",
///     occurred_at = occurred_at,
///     event_id = event_id
/// );
/// ```
#[macro_export]
macro_rules! domain_event {
    (
        $event_name:ident,
        event_type = $event_type:expr,
        schema_version = $schema_version:expr,
        aggregate_id = $agg_id_field:ident,
        aggregate_type = $agg_type:expr,
        occurred_at = $occurred_field:ident,
        event_id = $event_id_field:ident
    ) => {
        impl $crate::domain::foundation::DomainEvent for $event_name {
            fn event_type(&self) -> &'static str {
                $event_type
            }

            fn schema_version(&self) -> u32 {
                $schema_version
            }

            fn aggregate_id(&self) -> String {
                self.$agg_id_field.to_string()
            }

            fn aggregate_type(&self) -> &'static str {
                $agg_type
            }

            fn occurred_at(&self) -> $crate::domain::foundation::EpochMillis {
                self.$occurred_field
            }

            fn event_id(&self) -> $crate::domain::foundation::EventId {
                self.$event_id_field.clone()
            }
        }
    };
}

/// Unique identifier for events (used for deduplication).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventId(String);

impl EventId {
    /// Creates a new random EventId using UUID v4.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for EventId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Correlation context carried alongside an event.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventMetadata {
    /// ID linking the events of one sweep run.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<String>,
}

/// Transport envelope for domain events.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventEnvelope {
    pub event_id: EventId,

    /// Event type for routing (e.g., "tenant.trial_expired.v1").
    pub event_type: String,

    /// Extracted from the `event_type` suffix.
    pub schema_version: u32,

    pub aggregate_id: String,

    pub aggregate_type: String,

    pub occurred_at: EpochMillis,

    pub payload: JsonValue,

    pub metadata: EventMetadata,
}

impl EventEnvelope {
    /// Creates an envelope from a domain event, serializing it as the payload.
    pub fn from_event<T>(event: &T) -> Self
    where
        T: DomainEvent + Serialize + ?Sized,
    {
        let event_type = event.event_type().to_string();
        let schema_version = Self::extract_version(&event_type);

        let payload = match serde_json::to_value(event) {
            Ok(value) => value,
            Err(e) => {
                tracing::error!(event_type = %event_type, error = %e, "event payload serialization failed");
                JsonValue::Null
            }
        };

        Self {
            event_id: event.event_id(),
            event_type,
            schema_version,
            aggregate_id: event.aggregate_id(),
            aggregate_type: event.aggregate_type().to_string(),
            occurred_at: event.occurred_at(),
            payload,
            metadata: EventMetadata::default(),
        }
    }

    /// "tenant.trial_started.v2" yields 2; no suffix defaults to 1.
    pub(crate) fn extract_version(event_type: &str) -> u32 {
        event_type
            .rsplit_once(".v")
            .and_then(|(_, version_str)| version_str.parse::<u32>().ok())
            .unwrap_or(1)
    }

    pub fn with_correlation_id(mut self, id: impl Into<String>) -> Self {
        self.metadata.correlation_id = Some(id.into());
        self
    }

    /// Deserialize payload to a specific event type.
    pub fn payload_as<T: for<'de> Deserialize<'de>>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_value(self.payload.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
    struct SampleHappened {
        event_id: EventId,
        tenant_id: String,
        occurred_at: EpochMillis,
    }

    domain_event!(
        SampleHappened,
        event_type = "tenant.sample_happened.v2",
        schema_version = 2,
        aggregate_id = tenant_id,
        aggregate_type = "Tenant",
        occurred_at = occurred_at,
        event_id = event_id
    );

    fn sample() -> SampleHappened {
        SampleHappened {
            event_id: EventId::from_string("evt-1"),
            tenant_id: "biz-1".to_string(),
            occurred_at: EpochMillis::new(1_000),
        }
    }

    #[test]
    fn event_id_generates_unique_values() {
        assert_ne!(EventId::new(), EventId::new());
    }

    #[test]
    fn extract_version_reads_suffix() {
        assert_eq!(EventEnvelope::extract_version("tenant.trial_started.v1"), 1);
        assert_eq!(EventEnvelope::extract_version("tenant.trial_started.v10"), 10);
        assert_eq!(EventEnvelope::extract_version("legacy"), 1);
    }

    #[test]
    fn to_envelope_copies_event_identity() {
        let envelope = sample().to_envelope();

        assert_eq!(envelope.event_id.as_str(), "evt-1");
        assert_eq!(envelope.event_type, "tenant.sample_happened.v2");
        assert_eq!(envelope.schema_version, 2);
        assert_eq!(envelope.aggregate_id, "biz-1");
        assert_eq!(envelope.aggregate_type, "Tenant");
        assert_eq!(envelope.occurred_at, EpochMillis::new(1_000));
    }

    #[test]
    fn payload_round_trips_to_event() {
        let envelope = sample().to_envelope().with_correlation_id("sweep-7");
        let decoded: SampleHappened = envelope.payload_as().unwrap();

        assert_eq!(decoded, sample());
        assert_eq!(envelope.metadata.correlation_id.as_deref(), Some("sweep-7"));
    }

    #[test]
    fn metadata_omits_empty_fields() {
        let json = serde_json::to_value(EventMetadata::default()).unwrap();
        assert_eq!(json, serde_json::json!({}));
    }
}
