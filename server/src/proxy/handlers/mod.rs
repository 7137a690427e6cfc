//! Route table and rejection handling
//!
//! Every endpoint lives under `/api`. Path filters run before method
//! filters so that an unknown path is a 404 and a known path with the wrong
//! method is a 405.

pub mod ai;
pub mod auth;
pub mod common;
pub mod config;
pub mod gmail;

use std::collections::HashMap;
use std::convert::Infallible;
use std::sync::Arc;

use serde_json::json;
use tracing::debug;
use warp::http::StatusCode;
use warp::reject::{LengthRequired, MethodNotAllowed, PayloadTooLarge, UnsupportedMediaType};
use warp::reply::Response;
use warp::{Filter, Rejection};

use self::common::{json_reply, with_state, MAX_BODY_BYTES};
use super::AppState;

/// All API routes with rejections rendered as JSON.
pub fn routes(state: Arc<AppState>) -> impl Filter<Extract = (Response,), Error = Infallible> + Clone {
    let body = || warp::body::content_length_limit(MAX_BODY_BYTES).and(warp::body::bytes());
    let query = || warp::query::<HashMap<String, String>>();

    let auth_url = warp::path!("api" / "auth" / "url")
        .and(warp::get())
        .and(with_state(state.clone()))
        .then(auth::auth_url);

    let token_callback = warp::path!("api" / "token")
        .and(warp::get())
        .and(with_state(state.clone()))
        .and(query())
        .then(auth::token_callback);

    let token_exchange = warp::path!("api" / "token")
        .and(warp::post())
        .and(with_state(state.clone()))
        .and(body())
        .then(auth::token_exchange);

    let emails = warp::path!("api" / "emails")
        .and(warp::get())
        .and(with_state(state.clone()))
        .and(query())
        .then(gmail::list_emails);

    let send = warp::path!("api" / "send")
        .and(warp::post())
        .and(with_state(state.clone()))
        .and(body())
        .then(gmail::send_email);

    let summary = warp::path!("api" / "summary")
        .and(warp::post())
        .and(with_state(state.clone()))
        .and(body())
        .then(ai::summary);

    let prioritize = warp::path!("api" / "prioritize")
        .and(warp::post())
        .and(with_state(state.clone()))
        .and(body())
        .then(ai::prioritize);

    let generate = warp::path!("api" / "generate")
        .and(warp::post())
        .and(with_state(state.clone()))
        .and(body())
        .then(ai::generate);

    let debug_setup = warp::path!("api" / "debug-setup")
        .and(warp::get())
        .and(with_state(state))
        .then(config::debug_setup);

    auth_url
        .or(token_callback)
        .unify()
        .or(token_exchange)
        .unify()
        .or(emails)
        .unify()
        .or(send)
        .unify()
        .or(summary)
        .unify()
        .or(prioritize)
        .unify()
        .or(generate)
        .unify()
        .or(debug_setup)
        .unify()
        .recover(handle_rejection)
        .unify()
}

/// Render filter rejections as `{error}` JSON bodies.
///
/// Body and query problems win over a method mismatch, which wins over
/// "not found", since `or` keeps every branch's rejection.
async fn handle_rejection(err: Rejection) -> Result<Response, Infallible> {
    let (status, message) = if err.find::<PayloadTooLarge>().is_some() {
        (StatusCode::PAYLOAD_TOO_LARGE, "Request body too large")
    } else if err.find::<LengthRequired>().is_some() {
        (StatusCode::LENGTH_REQUIRED, "Content-Length required")
    } else if err.find::<UnsupportedMediaType>().is_some() {
        (StatusCode::UNSUPPORTED_MEDIA_TYPE, "Unsupported media type")
    } else if err.find::<warp::reject::InvalidQuery>().is_some() {
        (StatusCode::BAD_REQUEST, "Invalid query string")
    } else if err.find::<MethodNotAllowed>().is_some() {
        (StatusCode::METHOD_NOT_ALLOWED, "Method not allowed")
    } else if err.is_not_found() {
        (StatusCode::NOT_FOUND, "Not found")
    } else {
        (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
    };

    debug!("Rejected request: {:?}", err);
    Ok(json_reply(&json!({ "error": message }), status))
}
