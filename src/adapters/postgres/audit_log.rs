//! PostgreSQL audit log for lifecycle events.
//!
//! Implements `EventPublisher` by appending envelopes to `access_audit_log`.
//! Re-publishing an envelope with a known event ID is a no-op.

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Transaction};

use crate::domain::foundation::{DomainError, ErrorCode, EventEnvelope};
use crate::ports::EventPublisher;

pub struct PostgresAuditLog {
    pool: PgPool,
}

impl PostgresAuditLog {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn append(
        tx: &mut Transaction<'_, Postgres>,
        event: &EventEnvelope,
    ) -> Result<(), DomainError> {
        let metadata = serde_json::to_value(&event.metadata)
            .map_err(|e| DomainError::new(ErrorCode::SerializationError, e.to_string()))?;

        sqlx::query(
            r#"
            INSERT INTO access_audit_log (
                event_id, event_type, schema_version, aggregate_id, aggregate_type,
                occurred_at, payload, metadata
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (event_id) DO NOTHING
            "#,
        )
        .bind(event.event_id.as_str())
        .bind(&event.event_type)
        .bind(event.schema_version as i32)
        .bind(&event.aggregate_id)
        .bind(&event.aggregate_type)
        .bind(event.occurred_at.as_millis())
        .bind(&event.payload)
        .bind(metadata)
        .execute(&mut **tx)
        .await
        .map_err(|e| {
            DomainError::new(
                ErrorCode::DatabaseError,
                format!("Failed to append audit event {}: {}", event.event_type, e),
            )
        })?;

        Ok(())
    }
}

fn tx_error(e: sqlx::Error) -> DomainError {
    DomainError::new(ErrorCode::DatabaseError, format!("Audit log transaction failed: {}", e))
}

#[async_trait]
impl EventPublisher for PostgresAuditLog {
    async fn publish(&self, event: EventEnvelope) -> Result<(), DomainError> {
        self.publish_all(vec![event]).await
    }

    async fn publish_all(&self, events: Vec<EventEnvelope>) -> Result<(), DomainError> {
        if events.is_empty() {
            return Ok(());
        }

        let mut tx = self.pool.begin().await.map_err(tx_error)?;
        for event in &events {
            Self::append(&mut tx, event).await?;
        }
        tx.commit().await.map_err(tx_error)?;

        tracing::debug!(count = events.len(), "audit events appended");
        Ok(())
    }
}
