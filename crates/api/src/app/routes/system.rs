use axum::http::StatusCode;

/// Liveness probe; the envelope layer turns the empty reply into `200`.
pub async fn health() -> StatusCode {
    StatusCode::NO_CONTENT
}
