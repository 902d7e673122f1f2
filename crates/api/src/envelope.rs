//! Uniform response envelope.
//!
//! Every JSON/text response leaves the API as
//! `{ "success", "message", "data", "errors"?, "meta"? }`. Handlers may return
//! an [`Envelope`] directly; anything else is normalized by
//! [`envelope_transform`] on the way out:
//!
//! | Outcome | Result |
//! |---------|--------|
//! | opted out ([`Raw`]), binary body, unhandled fault | untouched |
//! | redirect, streamed or oversized body | untouched |
//! | already an envelope ([`Enveloped`] marker) | untouched |
//! | `204` or empty `2xx` | `200`, `data: null` |
//! | other `2xx` | same status, payload as `data` |
//! | non-`2xx` | same status, [`status_message`], payload as `errors` |

use axum::{
    body::{to_bytes, Body, HttpBody},
    extract::Request,
    http::{header, response::Parts, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::fault::Fault;

pub const DEFAULT_SUCCESS_MESSAGE: &str = "Thành công";

/// Upper bound on a response body the transform will buffer.
const MAX_BUFFERED_BODY: usize = 8 * 1024 * 1024;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope<T = Value> {
    pub success: bool,
    pub message: String,
    pub data: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<Value>,
}

impl<T> Envelope<T> {
    pub fn ok(data: T) -> Self {
        Self::ok_with(data, DEFAULT_SUCCESS_MESSAGE)
    }

    pub fn ok_with(data: T, message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: Some(data),
            errors: None,
            meta: None,
        }
    }

    /// Success with `data: null`.
    pub fn empty() -> Self {
        Self {
            success: true,
            message: DEFAULT_SUCCESS_MESSAGE.to_string(),
            data: None,
            errors: None,
            meta: None,
        }
    }

    pub fn fail(message: impl Into<String>, errors: Option<Value>) -> Self {
        Self {
            success: false,
            message: message.into(),
            data: None,
            errors,
            meta: None,
        }
    }

    pub fn with_meta(mut self, meta: Value) -> Self {
        self.meta = Some(meta);
        self
    }
}

/// Response marker: the body is already an envelope.
#[derive(Debug, Clone, Copy)]
pub struct Enveloped;

/// Response marker: leave this response alone.
#[derive(Debug, Clone, Copy)]
pub struct SkipEnvelope;

impl<T: Serialize> IntoResponse for Envelope<T> {
    fn into_response(self) -> Response {
        let mut res = Json(self).into_response();
        res.extensions_mut().insert(Enveloped);
        res
    }
}

/// Opt a handler's response out of enveloping.
#[derive(Debug, Clone)]
pub struct Raw<T>(pub T);

impl<T: IntoResponse> IntoResponse for Raw<T> {
    fn into_response(self) -> Response {
        let mut res = self.0.into_response();
        res.extensions_mut().insert(SkipEnvelope);
        res
    }
}

/// Human-readable message for a failure status.
pub fn status_message(status: StatusCode) -> &'static str {
    match status {
        StatusCode::BAD_REQUEST => "Bad Request",
        StatusCode::UNAUTHORIZED => "Unauthorized",
        StatusCode::FORBIDDEN => "Forbidden",
        StatusCode::NOT_FOUND => "Not Found",
        StatusCode::CONFLICT => "Conflict",
        StatusCode::UNPROCESSABLE_ENTITY => "Unprocessable Entity",
        StatusCode::INTERNAL_SERVER_ERROR => "Internal Server Error",
        _ => "Error",
    }
}

/// What a handler produced, as seen by the transform.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Bypass,
    Enveloped,
    NoContent,
    Payload {
        status: StatusCode,
        body: Option<Value>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum Normalized {
    Unchanged,
    Wrapped { status: StatusCode, envelope: Envelope },
}

/// Apply the envelope table to a single outcome.
pub fn normalize(outcome: Outcome) -> Normalized {
    match outcome {
        Outcome::Bypass | Outcome::Enveloped => Normalized::Unchanged,
        Outcome::NoContent => Normalized::Wrapped {
            status: StatusCode::OK,
            envelope: Envelope::empty(),
        },
        Outcome::Payload { status, body } if status.is_success() => match body {
            None => Normalized::Wrapped {
                status: StatusCode::OK,
                envelope: Envelope::empty(),
            },
            Some(data) => Normalized::Wrapped {
                status,
                envelope: Envelope::ok(data),
            },
        },
        Outcome::Payload { status, body } => Normalized::Wrapped {
            status,
            envelope: Envelope::fail(status_message(status), failure_errors(body)),
        },
    }
}

/// Validation payloads (objects carrying `errors`) contribute that map;
/// anything else is reported as-is.
fn failure_errors(body: Option<Value>) -> Option<Value> {
    match body {
        Some(Value::Object(mut map)) if map.contains_key("errors") => map.remove("errors"),
        other => other,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BodyKind {
    Json,
    Text,
    Empty,
    Other,
}

fn body_kind(headers: &HeaderMap) -> BodyKind {
    let Some(content_type) = headers.get(header::CONTENT_TYPE) else {
        return BodyKind::Empty;
    };
    let Ok(content_type) = content_type.to_str() else {
        return BodyKind::Other;
    };
    let mime = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();

    if mime == "application/json" || mime.ends_with("+json") {
        BodyKind::Json
    } else if mime.starts_with("text/") {
        BodyKind::Text
    } else {
        BodyKind::Other
    }
}

fn classify_head(parts: &Parts) -> Option<Outcome> {
    let ext = &parts.extensions;
    if ext.get::<SkipEnvelope>().is_some() || ext.get::<Fault>().is_some() {
        return Some(Outcome::Bypass);
    }
    if ext.get::<Enveloped>().is_some() {
        return Some(Outcome::Enveloped);
    }
    if parts.status == StatusCode::NO_CONTENT {
        return Some(Outcome::NoContent);
    }
    if parts.status.is_redirection() {
        return Some(Outcome::Bypass);
    }
    if body_kind(&parts.headers) == BodyKind::Other {
        return Some(Outcome::Bypass);
    }
    None
}

fn decode_body(kind: BodyKind, bytes: &[u8]) -> Option<Value> {
    if bytes.is_empty() {
        return None;
    }
    match kind {
        BodyKind::Json => Some(
            serde_json::from_slice(bytes)
                .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(bytes).into_owned())),
        ),
        _ => Some(Value::String(String::from_utf8_lossy(bytes).into_owned())),
    }
}

/// Only bodies of known length within [`MAX_BUFFERED_BODY`] are buffered.
fn fits_buffer(body: &Body) -> bool {
    body.size_hint()
        .upper()
        .is_some_and(|len| len <= MAX_BUFFERED_BODY as u64)
}

fn wrapped(parts: Parts, status: StatusCode, envelope: Envelope) -> Response {
    let mut res = (status, envelope).into_response();
    for (name, value) in parts.headers.iter() {
        if name != header::CONTENT_TYPE && name != header::CONTENT_LENGTH {
            res.headers_mut().append(name.clone(), value.clone());
        }
    }
    res
}

/// Middleware: normalize every response into an [`Envelope`].
pub async fn envelope_transform(req: Request, next: Next) -> Response {
    let res = next.run(req).await;
    let (parts, body) = res.into_parts();

    let outcome = match classify_head(&parts) {
        Some(outcome) => outcome,
        None if !fits_buffer(&body) => Outcome::Bypass,
        None => {
            let kind = body_kind(&parts.headers);
            let bytes = match to_bytes(body, MAX_BUFFERED_BODY).await {
                Ok(bytes) => bytes,
                Err(e) => {
                    return Fault::new(format!("failed to read response body: {e}"), "envelope")
                        .into_response();
                }
            };
            let outcome = Outcome::Payload {
                status: parts.status,
                body: decode_body(kind, &bytes),
            };
            return match normalize(outcome) {
                Normalized::Unchanged => Response::from_parts(parts, Body::from(bytes)),
                Normalized::Wrapped { status, envelope } => wrapped(parts, status, envelope),
            };
        }
    };

    match normalize(outcome) {
        Normalized::Unchanged => Response::from_parts(parts, body),
        Normalized::Wrapped { status, envelope } => wrapped(parts, status, envelope),
    }
}
