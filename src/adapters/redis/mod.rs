//! Redis adapters.

mod handoff_store;

pub use handoff_store::{RedisHandoffStore, DEFAULT_HANDOFF_TTL_SECS};
