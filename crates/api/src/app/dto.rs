use serde::{Deserialize, Serialize};

use portal_auth::Claims;

// -------------------------
// Request DTOs
// -------------------------

/// Fields are optional so that a missing field is a validation error, not a
/// body-parse rejection.
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RefreshRequest {
    pub refresh_token: Option<String>,
}

// -------------------------
// Response DTOs
// -------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MeResponse {
    pub user_id: i64,
    pub email: String,
    pub role_id: i32,
    pub role_name: String,
    pub permissions: Vec<String>,
}

impl From<&Claims> for MeResponse {
    fn from(claims: &Claims) -> Self {
        Self {
            user_id: claims.user_id().get(),
            email: claims.email().to_string(),
            role_id: claims.role_id().get(),
            role_name: claims.role_name().to_string(),
            permissions: claims
                .permissions()
                .iter()
                .map(|p| p.as_str().to_string())
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListingCreated {
    pub created: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListingApproved {
    pub id: i64,
    pub approved: bool,
}

/// The value as sent, or `None` when absent or whitespace-only.
pub fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
