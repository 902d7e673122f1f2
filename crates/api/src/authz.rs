//! Route-level permission gate.
//!
//! Policies are resolved once, when routes are registered; the gate only
//! evaluates the already-resolved [`Policy`] against the request principal.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use portal_auth::{explain_authorization, Policy};

use crate::app::errors::ApiError;
use crate::context::PrincipalContext;
use crate::middleware::UNAUTHORIZED_MESSAGE;

pub const FORBIDDEN_MESSAGE: &str = "Forbidden";

/// Middleware: allow the request only if the principal satisfies `policy`.
///
/// Must run after [`crate::middleware::auth_middleware`].
pub async fn require_policy(
    State(policy): State<Arc<Policy>>,
    req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let Some(principal) = req.extensions().get::<PrincipalContext>() else {
        return Err(ApiError::Unauthorized(UNAUTHORIZED_MESSAGE.to_string()));
    };

    if !policy.check(principal.claims()).is_allowed() {
        if let Policy::Permission(requirement) = policy.as_ref() {
            let explanation = explain_authorization(requirement, principal.claims());
            tracing::warn!(
                user_id = %principal.claims().user_id(),
                required = %explanation.required_permission,
                reason = %explanation.reason,
                "authorization denied"
            );
        }
        return Err(ApiError::Forbidden(FORBIDDEN_MESSAGE.to_string()));
    }

    Ok(next.run(req).await)
}
