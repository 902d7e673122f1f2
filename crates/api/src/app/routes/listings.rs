//! Listing endpoints. Each route is gated by a catalog permission.

use std::sync::Arc;

use axum::{extract::Path, middleware::from_fn_with_state, routing::post, Router};

use portal_auth::{AuthzError, PermissionCode, PolicyResolver};

use crate::app::dto::{ListingApproved, ListingCreated};
use crate::app::services::AppState;
use crate::authz::require_policy;
use crate::envelope::Envelope;

pub const APPROVED_MESSAGE: &str = "Duyệt thành công";

pub fn router(policies: &PolicyResolver) -> Result<Router<AppState>, AuthzError> {
    let create = Arc::new(policies.for_permission(PermissionCode::ListingCreate)?);
    let approve = Arc::new(policies.for_permission(PermissionCode::ListingApprove)?);

    Ok(Router::new()
        .route(
            "/api/listings",
            post(create_listing).route_layer(from_fn_with_state(create, require_policy)),
        )
        .route(
            "/api/listings/:id/approve",
            post(approve_listing).route_layer(from_fn_with_state(approve, require_policy)),
        ))
}

/// POST /api/listings
pub async fn create_listing() -> Envelope<ListingCreated> {
    Envelope::ok_with(
        ListingCreated { created: true },
        format!("Bạn có quyền '{}'", PermissionCode::ListingCreate),
    )
}

/// POST /api/listings/:id/approve
pub async fn approve_listing(Path(id): Path<i64>) -> Envelope<ListingApproved> {
    tracing::info!(listing_id = id, "listing approved");
    Envelope::ok_with(ListingApproved { id, approved: true }, APPROVED_MESSAGE)
}
