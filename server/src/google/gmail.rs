//! Gmail API v1 Client
//!
//! Provides methods for interacting with Gmail API:
//! - List inbox message IDs
//! - Fetch and normalize messages concurrently
//! - Send plain-text emails

use futures::future::join_all;
use inbox_assist_protocol::EmailMessage;
use reqwest::Client;
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use super::client::{GoogleApiError, GoogleClient};
use super::common::extract_array;
use super::message::{compose_raw, encode_raw, normalize, sort_newest_first, RawMessage};

/// Result of `users.messages.send`.
#[derive(Debug, Clone)]
pub struct SentMessage {
    pub id: String,
    pub thread_id: Option<String>,
}

pub struct GmailApi {
    client: GoogleClient,
    api_base: String,
}

impl GmailApi {
    /// Create a Gmail client for one caller's access token.
    pub fn new(http: Client, access_token: String, api_base: &str) -> Self {
        Self {
            client: GoogleClient::new(http, access_token),
            api_base: api_base.trim_end_matches('/').to_string(),
        }
    }

    /// List IDs of the newest inbox messages.
    pub async fn list_inbox_ids(&self, max_results: u32) -> Result<Vec<String>, GoogleApiError> {
        let url = format!("{}/users/me/messages", self.api_base);
        let query = [
            ("maxResults", max_results.to_string()),
            ("labelIds", "INBOX".to_string()),
        ];

        let response = self.client.get(&url, &query).await?;
        let ids: Vec<String> = extract_array(&response, "messages")
            .iter()
            .filter_map(|m| m.get("id").and_then(|v| v.as_str()).map(String::from))
            .collect();

        debug!("Listed {} inbox message IDs", ids.len());
        Ok(ids)
    }

    /// Get a message by ID in `full` format.
    pub async fn get_message(&self, id: &str) -> Result<RawMessage, GoogleApiError> {
        let url = format!("{}/users/me/messages/{}", self.api_base, urlencoding::encode(id));
        let value = self.client.get(&url, &[("format", "full".to_string())]).await?;

        serde_json::from_value(value).map_err(|e| GoogleApiError::Decode(e.to_string()))
    }

    /// List the inbox and fetch every message concurrently.
    ///
    /// A message that fails to fetch or decode is dropped and logged; the
    /// rest are returned newest first. Only a failure of the listing call
    /// itself is an error.
    pub async fn list_inbox_messages(&self, max_results: u32) -> Result<Vec<EmailMessage>, GoogleApiError> {
        info!("Listing Gmail inbox (maxResults={})", max_results);

        let ids = self.list_inbox_ids(max_results).await?;
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let fetches = ids.iter().map(|id| async move { (id, self.get_message(id).await) });
        let results = join_all(fetches).await;

        let total = results.len();
        let mut messages: Vec<EmailMessage> = results
            .into_iter()
            .filter_map(|(id, result)| match result {
                Ok(raw) => Some(normalize(raw)),
                Err(e) => {
                    warn!("Skipping message {}: {}", id, e);
                    None
                }
            })
            .collect();

        if messages.len() < total {
            warn!("Fetched {} of {} inbox messages", messages.len(), total);
        }

        sort_newest_first(&mut messages);
        Ok(messages)
    }

    /// Send a plain-text email.
    pub async fn send_message(&self, to: &str, subject: &str, body: &str) -> Result<SentMessage, GoogleApiError> {
        info!("Sending Gmail message ({} byte body)", body.len());

        let raw = encode_raw(&compose_raw(to, subject, body));
        let url = format!("{}/users/me/messages/send", self.api_base);
        let response = self.client.post(&url, &json!({ "raw": raw })).await?;

        parse_sent_message(&response)
    }
}

fn parse_sent_message(response: &Value) -> Result<SentMessage, GoogleApiError> {
    let id = response
        .get("id")
        .and_then(|v| v.as_str())
        .ok_or_else(|| GoogleApiError::Decode("send response is missing id".to_string()))?
        .to_string();

    let thread_id = response
        .get("threadId")
        .and_then(|v| v.as_str())
        .map(String::from);

    Ok(SentMessage { id, thread_id })
}
