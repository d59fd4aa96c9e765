//! HTTP adapter for the access engine.
//!
//! - `GET /tenants/:id/status` - Resolved access status
//! - `GET /tenants/:id/trial` - Trial countdown
//! - `POST /tenants` - Create a tenant with a trial
//! - `POST /tenants/:id/trial/extend` - Extend the trial
//! - `POST /tenants/:id/convert` - Convert the trial to a subscription
//! - `POST /tenants/:id/sign-in` - Sign-in gate
//! - `GET /trial-configs/:scope/active` - Active trial definition
//! - `PUT /trial-configs/:scope` - Save a scope's trial config
//! - `POST /admin/trials/sweep` - Run the expiring-trials sweep
//! - `POST /admin/trials/reapply` - Reapply the active definition

pub mod dto;
pub mod handlers;
pub mod routes;

pub use dto::*;
pub use handlers::{AccessApiError, AccessAppState, AccessSettings};
pub use routes::{access_router, access_routes};
