//! Axum router configuration for the access endpoints.

use axum::routing::{get, post, put};
use axum::Router;

use super::handlers::{
    convert_trial, create_tenant, extend_trial, get_active_definition, get_status, get_trial_countdown,
    reapply_definition, run_sweep, save_trial_config, sign_in_check, AccessAppState,
};

/// Tenant, trial config and admin routes, unprefixed.
pub fn access_routes() -> Router<AccessAppState> {
    Router::new()
        // Tenants
        .route("/tenants", post(create_tenant))
        .route("/tenants/:id/status", get(get_status))
        .route("/tenants/:id/trial", get(get_trial_countdown))
        .route("/tenants/:id/trial/extend", post(extend_trial))
        .route("/tenants/:id/convert", post(convert_trial))
        .route("/tenants/:id/sign-in", post(sign_in_check))
        // Trial configs
        .route("/trial-configs/:scope/active", get(get_active_definition))
        .route("/trial-configs/:scope", put(save_trial_config))
        // Admin
        .route("/admin/trials/sweep", post(run_sweep))
        .route("/admin/trials/reapply", post(reapply_definition))
}

/// The access routes mounted under `/api`.
pub fn access_router() -> Router<AccessAppState> {
    Router::new().nest("/api", access_routes())
}
