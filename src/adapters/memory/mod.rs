//! In-memory adapters.
//!
//! Used by the test suites and for running the service without Postgres or
//! Redis. Seeding and inspection helpers live on each type.

mod handoff;
mod identity;
mod notifier;
mod record_store;

pub use handoff::InMemoryHandoffStore;
pub use identity::InMemoryIdentityProvider;
pub use notifier::RecordingTrialNotifier;
pub use record_store::InMemoryRecordStore;
