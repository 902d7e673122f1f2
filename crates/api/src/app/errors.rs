//! Handler error type and its envelope rendering.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::Value;
use thiserror::Error;

use portal_infra::DirectoryError;

use crate::envelope::Envelope;
use crate::fault::Fault;

#[derive(Debug, Error)]
pub enum ApiError {
    /// Input rejected before any lookup; `errors` maps field to messages.
    #[error("{message}")]
    Validation { message: String, errors: Value },

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    /// Unexpected failure; rendered by the fault boundary.
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation { .. } => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<DirectoryError> for ApiError {
    fn from(err: DirectoryError) -> Self {
        ApiError::Internal(anyhow::Error::new(err))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let envelope = match self {
            ApiError::Internal(err) => return Fault::from_error(&err).into_response(),
            ApiError::Validation { message, errors } => Envelope::<()>::fail(message, Some(errors)),
            ApiError::Unauthorized(message) | ApiError::Forbidden(message) => {
                Envelope::fail(message, None)
            }
        };
        (status, envelope).into_response()
    }
}
