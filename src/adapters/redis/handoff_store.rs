//! Redis-backed handoff store.
//!
//! Reasons are stored under `<session>:subscription_error` with a TTL so an
//! abandoned redirect does not leave keys behind. `take` uses `GETDEL`, so a
//! reason is read at most once even with several landing pages racing.

use async_trait::async_trait;
use redis::aio::MultiplexedConnection;

use crate::domain::access::DenialReason;
use crate::domain::foundation::{DomainError, ErrorCode, SessionId};
use crate::ports::{handoff_key, HandoffStore};

/// Default lifetime of a stored reason.
pub const DEFAULT_HANDOFF_TTL_SECS: u64 = 900;

#[derive(Clone)]
pub struct RedisHandoffStore {
    conn: MultiplexedConnection,
    ttl_secs: u64,
}

impl RedisHandoffStore {
    pub fn new(conn: MultiplexedConnection) -> Self {
        Self {
            conn,
            ttl_secs: DEFAULT_HANDOFF_TTL_SECS,
        }
    }

    pub fn with_ttl_secs(mut self, ttl_secs: u64) -> Self {
        self.ttl_secs = ttl_secs;
        self
    }
}

fn cache_error(action: &str, e: redis::RedisError) -> DomainError {
    let err = DomainError::new(ErrorCode::CacheError, format!("Failed to {}: {}", action, e));
    if e.is_connection_refusal() || e.is_connection_dropped() || e.is_timeout() {
        err.with_detail("connect", "true")
    } else {
        err
    }
}

#[async_trait]
impl HandoffStore for RedisHandoffStore {
    async fn put(&self, session_id: &SessionId, reason: &DenialReason) -> Result<(), DomainError> {
        let payload = serde_json::to_string(reason)
            .map_err(|e| DomainError::new(ErrorCode::SerializationError, e.to_string()))?;

        let mut conn = self.conn.clone();
        redis::cmd("SET")
            .arg(handoff_key(session_id))
            .arg(payload)
            .arg("EX")
            .arg(self.ttl_secs)
            .query_async::<_, ()>(&mut conn)
            .await
            .map_err(|e| cache_error("store handoff reason", e))?;
        Ok(())
    }

    async fn take(&self, session_id: &SessionId) -> Result<Option<DenialReason>, DomainError> {
        let mut conn = self.conn.clone();
        let payload: Option<String> = redis::cmd("GETDEL")
            .arg(handoff_key(session_id))
            .query_async(&mut conn)
            .await
            .map_err(|e| cache_error("read handoff reason", e))?;

        payload
            .map(|raw| {
                serde_json::from_str(&raw).map_err(|e| {
                    DomainError::new(
                        ErrorCode::SerializationError,
                        format!("Malformed handoff reason: {}", e),
                    )
                })
            })
            .transpose()
    }
}
