use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};

use portal_auth::TokenService;

use crate::app::errors::ApiError;
use crate::context::PrincipalContext;

pub const UNAUTHORIZED_MESSAGE: &str = "Unauthorized";

/// Bearer authentication: verify the access token and attach the principal.
pub async fn auth_middleware(
    State(tokens): State<Arc<TokenService>>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_bearer(req.headers())
        .ok_or_else(|| ApiError::Unauthorized(UNAUTHORIZED_MESSAGE.to_string()))?;

    let claims = tokens.validate_access(token).map_err(|e| {
        tracing::debug!(error = %e, path = %req.uri().path(), "access token rejected");
        ApiError::Unauthorized(UNAUTHORIZED_MESSAGE.to_string())
    })?;

    req.extensions_mut().insert(PrincipalContext::new(claims));

    Ok(next.run(req).await)
}

fn extract_bearer(headers: &HeaderMap) -> Option<&str> {
    let header = headers.get(header::AUTHORIZATION)?.to_str().ok()?;

    let (scheme, token) = header.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("Bearer") {
        return None;
    }

    let token = token.trim();
    if token.is_empty() {
        return None;
    }

    Some(token)
}
