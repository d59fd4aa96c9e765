//! Adapters - Implementations of the ports.
//!
//! - `memory` and `events` back the tests and a database-free run
//! - `postgres` and `redis` are the production stores
//! - `http` exposes the handlers over axum

pub mod clock;
pub mod documents;
pub mod events;
pub mod http;
pub mod memory;
pub mod notify;
pub mod postgres;
pub mod redis;

pub use clock::{FixedClock, SystemClock};
pub use events::InMemoryEventBus;
pub use memory::{InMemoryHandoffStore, InMemoryIdentityProvider, InMemoryRecordStore, RecordingTrialNotifier};
pub use notify::TracingTrialNotifier;
pub use postgres::{PostgresAuditLog, PostgresRecordStore};
pub use redis::RedisHandoffStore;
