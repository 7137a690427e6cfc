//! OpenAI chat-completions client

use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, error};

#[derive(Debug, thiserror::Error)]
pub enum AiError {
    #[error("HTTP request failed: {0}")]
    Transport(String),

    #[error("OpenAI API error ({status}): {message}")]
    Api {
        status: u16,
        code: Option<String>,
        message: String,
    },

    #[error("Failed to parse OpenAI response: {0}")]
    Decode(String),

    #[error("No response content from AI")]
    EmptyResponse,

    #[error("AI returned invalid JSON format: {0}")]
    Format(String),
}

impl AiError {
    /// Provider error code (`insufficient_quota`, `invalid_api_key`, ...).
    pub fn code(&self) -> Option<&str> {
        match self {
            AiError::Api { code, .. } => code.as_deref(),
            _ => None,
        }
    }
}

/// One completion call: fixed system instruction plus user prompt.
#[derive(Debug, Clone)]
pub struct Completion<'a> {
    pub system: &'a str,
    pub user: String,
    pub max_tokens: u32,
    pub temperature: f32,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [Message<'a>; 2],
    max_tokens: u32,
    temperature: f32,
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

/// OpenAI API client for chat completions
#[derive(Clone)]
pub struct OpenAiClient {
    http: Client,
    api_key: String,
    model: String,
    api_base: String,
}

impl OpenAiClient {
    pub fn new(http: Client, api_key: String, model: String, api_base: &str) -> Self {
        Self {
            http,
            api_key,
            model,
            api_base: api_base.trim_end_matches('/').to_string(),
        }
    }

    /// Send a chat completion request and return the first choice's text.
    pub async fn complete(&self, completion: &Completion<'_>) -> Result<String, AiError> {
        let request = ChatRequest {
            model: &self.model,
            messages: [
                Message {
                    role: "system",
                    content: completion.system,
                },
                Message {
                    role: "user",
                    content: &completion.user,
                },
            ],
            max_tokens: completion.max_tokens,
            temperature: completion.temperature,
        };

        let response = self
            .http
            .post(format!("{}/chat/completions", self.api_base))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| AiError::Transport(e.to_string()))?;

        let status = response.status();
        debug!("OpenAI responded with {}", status);

        let body = response
            .text()
            .await
            .map_err(|e| AiError::Transport(format!("Failed to read response body: {}", e)))?;

        if !status.is_success() {
            let err = parse_api_error(status.as_u16(), &body);
            error!("{}", err);
            return Err(err);
        }

        let parsed: ChatResponse =
            serde_json::from_str(&body).map_err(|e| AiError::Decode(e.to_string()))?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or(AiError::EmptyResponse)
    }
}

/// Parse OpenAI's `{"error": {"message", "type", "code"}}` envelope.
fn parse_api_error(status: u16, body: &str) -> AiError {
    let parsed = serde_json::from_str::<Value>(body).unwrap_or(Value::Null);
    let error = parsed.get("error");

    let message = error
        .and_then(|e| e.get("message"))
        .and_then(|v| v.as_str())
        .map(String::from)
        .unwrap_or_else(|| body.chars().take(200).collect());

    let code = error
        .and_then(|e| e.get("code").or_else(|| e.get("type")))
        .and_then(|v| v.as_str())
        .map(String::from);

    AiError::Api {
        status,
        code,
        message,
    }
}
