//! Domain layer containing business logic and domain types.
//!
//! # Module Organization
//!
//! - `foundation` - Shared domain primitives (IDs, instants, errors, events)
//! - `access` - Trial configuration, status resolution rules, lifecycle types
pub mod access;
pub mod foundation;
