use std::sync::Arc;

use axum::{
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};

use portal_auth::{AuthzError, AUTHENTICATED_POLICY};

use crate::app::services::AppState;
use crate::{authz, middleware};

pub mod auth;
pub mod listings;
pub mod system;

/// Full routing tree. Policy names are resolved here, so an unknown policy
/// fails when the router is built.
pub fn router(state: &AppState) -> Result<Router<AppState>, AuthzError> {
    let authenticated = Arc::new(state.policies.resolve(AUTHENTICATED_POLICY)?);

    let protected = Router::new()
        .route(
            "/api/auth/me",
            get(auth::me).route_layer(from_fn_with_state(authenticated, authz::require_policy)),
        )
        .merge(listings::router(&state.policies)?)
        .route_layer(from_fn_with_state(
            Arc::clone(&state.tokens),
            middleware::auth_middleware,
        ));

    Ok(Router::new()
        .route("/health", get(system::health))
        .route("/api/auth/login", post(auth::login))
        .route("/api/auth/refresh", post(auth::refresh))
        .merge(protected))
}
