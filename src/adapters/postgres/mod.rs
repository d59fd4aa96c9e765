//! PostgreSQL adapters.
//!
//! - `PostgresRecordStore` - Tenants, subscriptions, plans and trial configs
//!   as JSONB documents
//! - `PostgresAuditLog` - Append-only lifecycle event log
//!
//! Schema lives in `migrations/`.

mod audit_log;
mod record_store;

pub use audit_log::PostgresAuditLog;
pub use record_store::PostgresRecordStore;
