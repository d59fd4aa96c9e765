//! Tenant Access - Trial and subscription access engine
//!
//! Decides, for one tenant at one instant, whether the tenant may use the
//! application and why. Also runs the trial lifecycle (create, extend,
//! convert, expire) and enforces the decision on live sessions.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
