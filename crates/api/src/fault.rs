//! Last-resort failure handling.
//!
//! Unhandled errors and panics are turned into a [`Fault`] carried as a
//! response extension; [`fault_boundary`] renders it as a `500` envelope and
//! only includes diagnostic detail in development.

use std::any::Any;
use std::backtrace::BacktraceStatus;

use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde::Serialize;

use crate::config::RunMode;
use crate::envelope::{status_message, Envelope};

/// Diagnostic record of an unhandled failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Fault {
    pub message: String,
    pub source: String,
    pub stack_trace: Option<String>,
}

impl Fault {
    pub fn new(message: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: source.into(),
            stack_trace: None,
        }
    }

    pub fn from_error(err: &anyhow::Error) -> Self {
        let source = err
            .chain()
            .skip(1)
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(": ");
        let backtrace = err.backtrace();

        Self {
            message: err.to_string(),
            source: if source.is_empty() { "portal-api".to_string() } else { source },
            stack_trace: (backtrace.status() == BacktraceStatus::Captured).then(|| backtrace.to_string()),
        }
    }

    pub fn from_panic(payload: &(dyn Any + Send)) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&'static str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "handler panicked".to_string()
        };
        Self::new(message, "panic")
    }
}

/// An empty `500` tagged with the fault; the boundary renders the body.
impl IntoResponse for Fault {
    fn into_response(self) -> Response {
        let mut res = StatusCode::INTERNAL_SERVER_ERROR.into_response();
        res.extensions_mut().insert(self);
        res
    }
}

/// `CatchPanicLayer` handler.
pub fn panic_response(payload: Box<dyn Any + Send + 'static>) -> Response {
    Fault::from_panic(payload.as_ref()).into_response()
}

pub fn render(fault: &Fault, mode: RunMode) -> Response {
    let errors = if mode.is_development() {
        serde_json::to_value(fault).ok()
    } else {
        None
    };
    let envelope = Envelope::<()>::fail(status_message(StatusCode::INTERNAL_SERVER_ERROR), errors);
    (StatusCode::INTERNAL_SERVER_ERROR, envelope).into_response()
}

/// Middleware: outermost failure boundary.
pub async fn fault_boundary(State(mode): State<RunMode>, req: Request, next: Next) -> Response {
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    let mut res = next.run(req).await;
    match res.extensions_mut().remove::<Fault>() {
        Some(fault) => {
            tracing::error!(
                %method,
                %path,
                error = %fault.message,
                source = %fault.source,
                "unhandled failure"
            );
            render(&fault, mode)
        }
        None => res,
    }
}
