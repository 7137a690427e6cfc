//! Gmail message normalization and outgoing message encoding.

use std::cmp::Reverse;

use base64::engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD};
use base64::Engine;
use inbox_assist_protocol::EmailMessage;
use serde::Deserialize;

pub const UNDECODABLE_BODY: &str = "Unable to decode email content";

const UNKNOWN_SENDER: &str = "Unknown";
const NO_SUBJECT: &str = "No Subject";

/// Message resource as returned by `users.messages.get?format=full`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawMessage {
    pub id: String,
    #[serde(default)]
    pub thread_id: Option<String>,
    #[serde(default)]
    pub snippet: Option<String>,
    #[serde(default)]
    pub internal_date: Option<String>,
    #[serde(default)]
    pub label_ids: Option<Vec<String>>,
    #[serde(default)]
    pub payload: Option<MessagePart>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessagePart {
    #[serde(default)]
    pub mime_type: Option<String>,
    #[serde(default)]
    pub headers: Vec<MessageHeader>,
    #[serde(default)]
    pub body: Option<MessagePartBody>,
    #[serde(default)]
    pub parts: Vec<MessagePart>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MessageHeader {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MessagePartBody {
    /// Base64url-encoded content.
    #[serde(default)]
    pub data: Option<String>,
}

impl RawMessage {
    /// Header value by exact (case-sensitive) name.
    fn header(&self, name: &str) -> Option<&str> {
        self.payload
            .as_ref()?
            .headers
            .iter()
            .find(|h| h.name == name)
            .map(|h| h.value.as_str())
    }
}

/// Normalize a Gmail message into the API's `EmailMessage`.
pub fn normalize(raw: RawMessage) -> EmailMessage {
    let from = raw.header("From").unwrap_or(UNKNOWN_SENDER).to_string();
    let subject = raw.header("Subject").unwrap_or(NO_SUBJECT).to_string();
    let date = raw.header("Date").unwrap_or_default().to_string();
    let to = raw.header("To").map(String::from);
    let body = extract_body(&raw);

    EmailMessage {
        id: raw.id,
        thread_id: raw.thread_id,
        from,
        subject,
        date,
        to,
        snippet: raw.snippet.unwrap_or_default(),
        body,
        internal_date: raw.internal_date.unwrap_or_default(),
        label_ids: raw.label_ids,
    }
}

/// Body text, in order of preference: the snippet, the first `text/plain`
/// part, the top-level body.
fn extract_body(raw: &RawMessage) -> String {
    if let Some(snippet) = raw.snippet.as_deref().filter(|s| !s.is_empty()) {
        return snippet.to_string();
    }

    let Some(payload) = &raw.payload else {
        return String::new();
    };

    let data = first_plain_text_data(&payload.parts)
        .or_else(|| payload.body.as_ref().and_then(|b| b.data.as_deref()));

    match data {
        Some(data) => decode_base64url(data).unwrap_or_else(|| UNDECODABLE_BODY.to_string()),
        None => String::new(),
    }
}

/// Depth-first search for the first `text/plain` part carrying data.
fn first_plain_text_data(parts: &[MessagePart]) -> Option<&str> {
    parts.iter().find_map(|part| {
        let own = (part.mime_type.as_deref() == Some("text/plain"))
            .then(|| part.body.as_ref().and_then(|b| b.data.as_deref()))
            .flatten();
        own.or_else(|| first_plain_text_data(&part.parts))
    })
}

/// Decode base64url text into UTF-8. Tolerates padding and the standard
/// alphabet; returns `None` for invalid base64 or invalid UTF-8.
pub fn decode_base64url(data: &str) -> Option<String> {
    let normalized: String = data
        .trim()
        .trim_end_matches('=')
        .chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| match c {
            '+' => '-',
            '/' => '_',
            other => other,
        })
        .collect();

    let bytes = URL_SAFE_NO_PAD.decode(normalized).ok()?;
    String::from_utf8(bytes).ok()
}

/// Sort newest first by `internalDate`. Stable, so equal dates keep their
/// relative order; malformed dates sort as the epoch.
pub fn sort_newest_first(messages: &mut [EmailMessage]) {
    messages.sort_by_key(|m| Reverse(m.internal_date_millis()));
}

/// Build the RFC 2822 message submitted to `users.messages.send`.
pub fn compose_raw(to: &str, subject: &str, body: &str) -> String {
    [
        format!("To: {}", to),
        format!("Subject: {}", encode_header_value(subject)),
        "Content-Type: text/plain; charset=utf-8".to_string(),
        String::new(),
        body.to_string(),
    ]
    .join("\r\n")
}

/// Base64url without padding, as the `raw` field requires.
///
/// Same output as standard base64 with `+`→`-`, `/`→`_` and trailing `=`
/// removed.
pub fn encode_raw(message: &str) -> String {
    URL_SAFE_NO_PAD.encode(message.as_bytes())
}

/// RFC 2047 encoded-word for non-ASCII header values.
fn encode_header_value(value: &str) -> String {
    if value.is_ascii() {
        value.to_string()
    } else {
        format!("=?UTF-8?B?{}?=", STANDARD.encode(value.as_bytes()))
    }
}
