//! HTTP application wiring (Axum router + middleware stack).
//!
//! - `services.rs`: login/refresh service and shared state
//! - `routes/`: HTTP routes + handlers (one file per area)
//! - `dto.rs`: request/response DTOs
//! - `errors.rs`: handler error type

use axum::{middleware::from_fn, middleware::from_fn_with_state, Router};
use tower::ServiceBuilder;
use tower_http::{catch_panic::CatchPanicLayer, cors::CorsLayer, trace::TraceLayer};

use portal_auth::AuthzError;

use crate::{envelope, fault};

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

pub use services::AppState;

/// Build the full HTTP router (public entrypoint used by `main.rs`).
///
/// Layers, outermost first: request tracing, CORS, fault boundary, panic
/// capture, envelope transform.
pub fn build_app(state: AppState) -> Result<Router, AuthzError> {
    let mode = state.mode;
    let router = routes::router(&state)?.with_state(state);

    Ok(router.layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(CorsLayer::permissive())
            .layer(from_fn_with_state(mode, fault::fault_boundary))
            .layer(CatchPanicLayer::custom(fault::panic_response))
            .layer(from_fn(envelope::envelope_transform)),
    ))
}
