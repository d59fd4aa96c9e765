//! Event bus adapters.
//!
//! - `InMemoryEventBus` - In-process bus capturing envelopes for tests
//! - `PostgresAuditLog` (in `adapters::postgres`) - Durable audit trail

mod in_memory;

pub use in_memory::InMemoryEventBus;
