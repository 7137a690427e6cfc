//! Gmail Handler
//!
//! Inbox listing and sending on behalf of the caller's bearer token.

use std::collections::HashMap;
use std::sync::Arc;

use inbox_assist_protocol::{EmailMessage, SendResponse};
use tracing::info;
use warp::hyper::body::Bytes;
use warp::reply::Response;

use super::common::{parse_json_object, require_fields, respond};
use crate::common::{AppError, AppResult};
use crate::google::{GmailApi, GoogleApiError};
use crate::proxy::AppState;

pub const DEFAULT_MAX_RESULTS: u32 = 10;
/// Gmail's page size limit for `users.messages.list`.
pub const MAX_RESULTS_LIMIT: u32 = 500;

const SEND_FIELDS: &[&str] = &["access_token", "to", "subject", "body"];

/// `GET /api/emails?access_token=…&maxResults=…`
pub async fn list_emails(state: Arc<AppState>, query: HashMap<String, String>) -> Response {
    respond(list_emails_inner(&state, &query).await)
}

/// `POST /api/send`
pub async fn send_email(state: Arc<AppState>, body: Bytes) -> Response {
    respond(send_email_inner(&state, &body).await)
}

async fn list_emails_inner(state: &AppState, query: &HashMap<String, String>) -> AppResult<Vec<EmailMessage>> {
    let access_token = query
        .get("access_token")
        .filter(|t| !t.trim().is_empty())
        .ok_or_else(|| AppError::validation("Access token required"))?;
    let max_results = parse_max_results(query.get("maxResults").map(String::as_str))?;

    info!("Listing emails (maxResults={}, token {} chars)", max_results, access_token.len());

    let gmail = GmailApi::new(
        state.http.clone(),
        access_token.clone(),
        &state.config.endpoints.gmail_api,
    );

    let emails = gmail
        .list_inbox_messages(max_results)
        .await
        .map_err(|e| gmail_error(e, "Failed to fetch emails", "Permission denied. Please grant Gmail read access."))?;

    info!("Returning {} emails", emails.len());
    Ok(emails)
}

async fn send_email_inner(state: &AppState, body: &Bytes) -> AppResult<SendResponse> {
    let params = parse_json_object(body)?;
    require_fields(&params, SEND_FIELDS)?;

    // Presence was checked above.
    let field = |key: &str| params.get(key).and_then(|v| v.as_str()).unwrap_or_default();
    let (access_token, to, subject, text) = (field("access_token"), field("to"), field("subject"), field("body"));

    for (name, value) in [("to", to), ("subject", subject)] {
        if value.contains(['\r', '\n']) {
            return Err(AppError::validation("Invalid header value")
                .with_details(format!("'{}' must not contain line breaks", name)));
        }
    }

    info!("Sending email ({} byte body)", text.len());

    let gmail = GmailApi::new(
        state.http.clone(),
        access_token.to_string(),
        &state.config.endpoints.gmail_api,
    );

    let sent = gmail
        .send_message(to, subject, text)
        .await
        .map_err(|e| gmail_error(e, "Failed to send email", "Permission denied. Please grant Gmail send access."))?;

    info!("Email sent (id {})", sent.id);
    Ok(SendResponse {
        success: true,
        message: "Email sent successfully".to_string(),
        id: sent.id,
        thread_id: sent.thread_id,
    })
}

/// Default 10, clamped to Gmail's page limit; non-numeric input is rejected.
fn parse_max_results(raw: Option<&str>) -> AppResult<u32> {
    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return Ok(DEFAULT_MAX_RESULTS);
    };

    let value: i64 = raw.parse().map_err(|_| {
        AppError::validation("maxResults must be a number").with_details(format!("got '{}'", raw))
    })?;

    Ok(value.clamp(1, MAX_RESULTS_LIMIT as i64) as u32)
}

fn gmail_error(err: GoogleApiError, failure: &str, forbidden: &str) -> AppError {
    let details = err.to_string();
    match err.status() {
        Some(401) => AppError::upstream_auth("Access token expired or invalid. Please sign in again.").with_details(details),
        Some(403) => AppError::upstream_permission(forbidden).with_details(details),
        Some(_) => AppError::upstream_generic(failure).with_details(details),
        None => AppError::internal(failure).with_details(details),
    }
}
