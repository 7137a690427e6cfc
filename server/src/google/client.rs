//! Google API Authenticated HTTP Client
//!
//! Injects the caller's bearer token and maps Google's REST error envelope
//! into `GoogleApiError`, keeping the HTTP status so handlers can tell an
//! expired token from a missing scope.

use reqwest::{Client, RequestBuilder, StatusCode};
use serde_json::Value;
use tracing::{debug, error, warn};

#[derive(Debug, thiserror::Error)]
pub enum GoogleApiError {
    #[error("HTTP request failed: {0}")]
    Transport(String),

    #[error("{message}")]
    Status { status: u16, message: String },

    #[error("Failed to parse JSON response: {0}")]
    Decode(String),
}

impl GoogleApiError {
    /// HTTP status returned by Google, if the request got that far.
    pub fn status(&self) -> Option<u16> {
        match self {
            GoogleApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Google API HTTP client with OAuth token injection
pub struct GoogleClient {
    client: Client,
    access_token: String,
}

impl GoogleClient {
    pub fn new(client: Client, access_token: String) -> Self {
        Self {
            client,
            access_token,
        }
    }

    /// Make an authenticated GET request
    pub async fn get(&self, url: &str, query: &[(&str, String)]) -> Result<Value, GoogleApiError> {
        let builder = self
            .client
            .get(url)
            .query(query)
            .bearer_auth(&self.access_token);

        self.execute_request(builder).await
    }

    /// Make an authenticated POST request with JSON body
    pub async fn post(&self, url: &str, body: &Value) -> Result<Value, GoogleApiError> {
        let builder = self
            .client
            .post(url)
            .bearer_auth(&self.access_token)
            .json(body);

        self.execute_request(builder).await
    }

    /// Execute a request and handle Google API response patterns
    async fn execute_request(&self, builder: RequestBuilder) -> Result<Value, GoogleApiError> {
        let response = builder
            .send()
            .await
            .map_err(|e| GoogleApiError::Transport(e.to_string()))?;

        let status = response.status();
        debug!("Google API response status: {}", status);

        let body = response
            .text()
            .await
            .map_err(|e| GoogleApiError::Transport(format!("Failed to read response body: {}", e)))?;

        if status == StatusCode::TOO_MANY_REQUESTS {
            warn!("Rate limited by Google API");
            return Err(GoogleApiError::Status {
                status: status.as_u16(),
                message: "Rate limited. Please try again later.".to_string(),
            });
        }

        if !status.is_success() {
            let parsed = serde_json::from_str::<Value>(&body).unwrap_or(Value::Null);
            let message = extract_error_message(&parsed, status);
            error!("Google API error: {}", message);
            return Err(GoogleApiError::Status {
                status: status.as_u16(),
                message,
            });
        }

        if body.is_empty() {
            return Ok(Value::Object(serde_json::Map::new()));
        }

        serde_json::from_str(&body).map_err(|e| GoogleApiError::Decode(e.to_string()))
    }
}

/// Extract error message from Google API error response
///
/// Google APIs return errors as
/// `{"error": {"code": 401, "message": "...", "status": "UNAUTHENTICATED"}}`.
fn extract_error_message(response: &Value, status: StatusCode) -> String {
    if let Some(error_obj) = response.get("error") {
        if let Some(message) = error_obj.get("message").and_then(|v| v.as_str()) {
            let code = error_obj
                .get("code")
                .and_then(|v| v.as_i64())
                .unwrap_or(status.as_u16() as i64);

            return format!("Google API error {}: {}", code, message);
        }
    }

    format!("HTTP {} error", status)
}
