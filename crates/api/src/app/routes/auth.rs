//! Authentication endpoints.

use axum::{
    extract::{Extension, State},
    Json,
};
use serde_json::json;

use portal_auth::TokenPair;

use crate::app::dto::{non_blank, LoginRequest, MeResponse, RefreshRequest};
use crate::app::errors::ApiError;
use crate::app::services::AppState;
use crate::context::PrincipalContext;
use crate::envelope::Envelope;

pub const MISSING_CREDENTIALS: &str = "Thiếu email hoặc mật khẩu.";
pub const LOGIN_SUCCEEDED: &str = "Đăng nhập thành công";
pub const REFRESH_TOKEN_REQUIRED: &str = "refreshToken is required";
pub const REFRESH_SUCCEEDED: &str = "Làm mới token thành công";
pub const CURRENT_USER: &str = "Thông tin người dùng";

/// POST /api/auth/login
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Envelope<TokenPair>, ApiError> {
    let email = non_blank(req.email);
    let password = non_blank(req.password);

    let (Some(email), Some(password)) = (email.as_deref(), password.as_deref()) else {
        let mut errors = serde_json::Map::new();
        if email.is_none() {
            errors.insert("email".into(), json!(["Email is required"]));
        }
        if password.is_none() {
            errors.insert("password".into(), json!(["Password is required"]));
        }
        return Err(ApiError::Validation {
            message: MISSING_CREDENTIALS.to_string(),
            errors: errors.into(),
        });
    };

    let pair = state.auth.login(email, password).await?;
    Ok(Envelope::ok_with(pair, LOGIN_SUCCEEDED))
}

/// POST /api/auth/refresh
pub async fn refresh(
    State(state): State<AppState>,
    Json(req): Json<RefreshRequest>,
) -> Result<Envelope<TokenPair>, ApiError> {
    let Some(token) = non_blank(req.refresh_token) else {
        return Err(ApiError::Validation {
            message: REFRESH_TOKEN_REQUIRED.to_string(),
            errors: json!({ "refreshToken": [REFRESH_TOKEN_REQUIRED] }),
        });
    };

    let pair = state.auth.refresh(token.trim()).await?;
    Ok(Envelope::ok_with(pair, REFRESH_SUCCEEDED))
}

/// GET /api/auth/me
pub async fn me(Extension(principal): Extension<PrincipalContext>) -> Envelope<MeResponse> {
    Envelope::ok_with(MeResponse::from(principal.claims()), CURRENT_USER)
}
