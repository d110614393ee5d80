// src/logging_middleware.rs
//! Middleware for logging request and response bodies in debug mode

use axum::body::to_bytes;
use axum::{
    body::{Body, Bytes},
    extract::Request,
    http::{header, HeaderMap, StatusCode},
    middleware::Next,
    response::Response,
};
use serde_json::Value;
use tracing::{debug, Level};

/// Keys whose values never reach the logs
const REDACTED_KEYS: [&str; 3] = ["password", "otp", "code"];

fn is_redacted(key: &str) -> bool {
    let key = key.to_ascii_lowercase();
    REDACTED_KEYS.iter().any(|redacted| key.contains(redacted))
}

/// Replaces sensitive values at any depth.
fn redact(value: &mut Value) {
    match value {
        Value::Object(map) => {
            for (key, inner) in map.iter_mut() {
                if is_redacted(key) {
                    *inner = Value::String("[REDACTED]".to_string());
                } else {
                    redact(inner);
                }
            }
        }
        Value::Array(items) => items.iter_mut().for_each(redact),
        _ => {}
    }
}

fn printable_body(bytes: &Bytes) -> Option<String> {
    if bytes.is_empty() {
        return None;
    }
    let body_str = std::str::from_utf8(bytes).ok()?;
    match serde_json::from_str::<Value>(body_str) {
        Ok(mut json) => {
            redact(&mut json);
            Some(serde_json::to_string_pretty(&json).unwrap_or_else(|_| json.to_string()))
        }
        // Non-JSON bodies (form posts, plain text) may carry anything
        Err(_) => Some(format!("<{} bytes>", bytes.len())),
    }
}

fn is_event_stream(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.starts_with("text/event-stream"))
        .unwrap_or(false)
}

/// Middleware to log request and response bodies in debug mode
pub async fn log_request_response(request: Request, next: Next) -> Result<Response, StatusCode> {
    if !tracing::enabled!(Level::DEBUG) {
        return Ok(next.run(request).await);
    }

    let (parts, body) = request.into_parts();
    let bytes = to_bytes(body, usize::MAX)
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    if let Some(request_body) = printable_body(&bytes) {
        debug!(
            method = %parts.method,
            uri = %parts.uri.path(),
            request_body = %request_body,
            "📥 Request"
        );
    }

    let request = Request::from_parts(parts, Body::from(bytes));
    let response = next.run(request).await;

    // Streams stay open for the life of the subscription
    if is_event_stream(response.headers()) {
        return Ok(response);
    }

    let (parts, body) = response.into_parts();
    let bytes = to_bytes(body, usize::MAX)
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    if let Some(response_body) = printable_body(&bytes) {
        debug!(
            status = %parts.status,
            response_body = %response_body,
            "📤 Response"
        );
    }

    Ok(Response::from_parts(parts, Body::from(bytes)))
}
