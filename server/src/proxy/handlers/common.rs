//! Common Handler Utilities
//!
//! Shared parameter extraction and response construction.

use std::convert::Infallible;
use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use tracing::{error, warn};
use warp::http::StatusCode;
use warp::hyper::body::Bytes;
use warp::reply::Response;
use warp::{Filter, Reply};

use super::super::AppState;
use crate::common::{escape_html, AppError, AppResult, ErrorKind};

/// Request bodies larger than this are rejected with 413.
pub const MAX_BODY_BYTES: u64 = 1024 * 1024;

/// Inject the shared state into a filter chain.
pub fn with_state(state: Arc<AppState>) -> impl Filter<Extract = (Arc<AppState>,), Error = Infallible> + Clone {
    warp::any().map(move || Arc::clone(&state))
}

// ────────────────────────────────────────────────────────────────────────────
// Parameter Extraction Helpers
// ────────────────────────────────────────────────────────────────────────────

/// Parse a request body as a JSON object.
pub fn parse_json_object(body: &Bytes) -> AppResult<Value> {
    let value: Value = serde_json::from_slice(body)
        .map_err(|e| AppError::validation("Invalid JSON body").with_details(e.to_string()))?;

    if !value.is_object() {
        return Err(AppError::validation("Request body must be a JSON object"));
    }
    Ok(value)
}

/// Extract a non-empty string parameter
pub fn non_empty_string<'a>(params: &'a Value, key: &str) -> Option<&'a str> {
    params
        .get(key)
        .and_then(|v| v.as_str())
        .filter(|s| !s.trim().is_empty())
}

/// Extract a required non-empty string parameter
pub fn require_string<'a>(params: &'a Value, key: &str, message: &str) -> AppResult<&'a str> {
    non_empty_string(params, key).ok_or_else(|| AppError::validation(message))
}

/// Extract an optional string parameter
pub fn optional_string<'a>(params: &'a Value, key: &str) -> Option<&'a str> {
    params.get(key).and_then(|v| v.as_str())
}

/// Fail with one validation error naming every absent field.
pub fn require_fields(params: &Value, required: &[&str]) -> AppResult<()> {
    let missing: Vec<String> = required
        .iter()
        .filter(|key| non_empty_string(params, key).is_none())
        .map(|key| key.to_string())
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(AppError::missing_fields(required, missing))
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Response Helpers
// ────────────────────────────────────────────────────────────────────────────

/// JSON response with an explicit status
pub fn json_reply<T: Serialize>(value: &T, status: StatusCode) -> Response {
    warp::reply::with_status(warp::reply::json(value), status).into_response()
}

/// JSON error response; logs the full error.
pub fn error_reply(err: &AppError) -> Response {
    match err.kind {
        ErrorKind::Validation => warn!("Rejected request: {}", err),
        _ => error!("Request failed: {}", err),
    }
    json_reply(&err.to_body(), err.status())
}

/// 200 with the value, or the error's status and body.
pub fn respond<T: Serialize>(result: AppResult<T>) -> Response {
    match result {
        Ok(value) => json_reply(&value, StatusCode::OK),
        Err(err) => error_reply(&err),
    }
}

/// Minimal standalone HTML page. `body_html` must already be escaped.
pub fn html_page(status: StatusCode, title: &str, body_html: &str) -> Response {
    let page = format!(
        r#"<!DOCTYPE html>
<html>
  <head><meta charset="utf-8"><title>{title}</title></head>
  <body style="font-family: Arial, sans-serif; padding: 40px; text-align: center;">
    <h1>{title}</h1>
    {body_html}
    <p><a href="/" style="padding: 10px 20px; background: #4285f4; color: white; text-decoration: none; border-radius: 5px;">Return Home</a></p>
  </body>
</html>"#,
        title = escape_html(title),
        body_html = body_html,
    );
    warp::reply::with_status(warp::reply::html(page), status).into_response()
}
