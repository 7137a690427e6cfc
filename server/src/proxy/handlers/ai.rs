//! AI Handler
//!
//! Summary, priority classification and drafting endpoints.

use std::sync::Arc;

use inbox_assist_protocol::{ComposeResponse, EmailMessage, PriorityResponse, SummaryResponse};
use serde_json::Value;
use tracing::info;
use warp::hyper::body::Bytes;
use warp::reply::Response;

use super::common::{optional_string, parse_json_object, require_string, respond};
use crate::ai::{self, AiError, OpenAiClient};
use crate::common::{AppError, AppResult};
use crate::proxy::AppState;

/// `POST /api/summary` with `{emails}`
pub async fn summary(state: Arc<AppState>, body: Bytes) -> Response {
    let result = async {
        let emails = parse_emails(&parse_json_object(&body)?)?;
        let client = openai_client(&state)?;
        ai::summarize(&client, &emails)
            .await
            .map_err(|e| ai_error(e, "Failed to generate summary"))
    }
    .await;

    respond::<SummaryResponse>(result)
}

/// `POST /api/prioritize` with `{emails}`
pub async fn prioritize(state: Arc<AppState>, body: Bytes) -> Response {
    let result = async {
        let emails = parse_emails(&parse_json_object(&body)?)?;
        let client = openai_client(&state)?;
        ai::prioritize(&client, &emails)
            .await
            .map_err(|e| ai_error(e, "Failed to prioritize emails"))
    }
    .await;

    respond::<PriorityResponse>(result)
}

/// `POST /api/generate` with `{subject, tone?, keyPoints?}`
pub async fn generate(state: Arc<AppState>, body: Bytes) -> Response {
    let result = async {
        let params = parse_json_object(&body)?;
        let subject = require_string(&params, "subject", "Subject is required")?;
        let client = openai_client(&state)?;

        info!("Generating email draft");
        ai::compose(
            &client,
            subject,
            optional_string(&params, "tone"),
            optional_string(&params, "keyPoints"),
        )
        .await
        .map_err(|e| ai_error(e, "Failed to generate email"))
    }
    .await;

    respond::<ComposeResponse>(result)
}

fn openai_client(state: &AppState) -> AppResult<OpenAiClient> {
    let api_key = state
        .config
        .openai_api_key
        .as_ref()
        .ok_or_else(|| AppError::configuration("Server configuration error: OPENAI_API_KEY is missing"))?;

    Ok(OpenAiClient::new(
        state.http.clone(),
        api_key.clone(),
        state.config.openai_model.clone(),
        &state.config.endpoints.openai_api,
    ))
}

/// `emails` must be present and an array of message objects.
fn parse_emails(params: &Value) -> AppResult<Vec<EmailMessage>> {
    let emails = params
        .get("emails")
        .filter(|v| v.is_array())
        .ok_or_else(|| AppError::validation("Emails array required"))?;

    serde_json::from_value(emails.clone())
        .map_err(|e| AppError::validation("Emails array required").with_details(e.to_string()))
}

/// Translate provider failures into the categories shown to users. The
/// provider's own message always goes to `details`.
fn ai_error(err: AiError, failure: &str) -> AppError {
    let details = err.to_string();

    if let AiError::Format(_) | AiError::EmptyResponse = err {
        return AppError::upstream_format("AI response format error. Please try again.").with_details(details);
    }

    let invalid_key = err.code() == Some("invalid_api_key") || matches!(err, AiError::Api { status: 401, .. });
    let message = if err.code() == Some("insufficient_quota") {
        "AI service quota exceeded. Please check your OpenAI API limits."
    } else if invalid_key {
        "Invalid AI API key. Please check your OpenAI API configuration."
    } else {
        failure
    };

    match err {
        AiError::Transport(_) => AppError::internal(message).with_details(details),
        _ => AppError::upstream_generic(message).with_details(details),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::ErrorKind;
    use serde_json::json;

    fn api_error(status: u16, code: Option<&str>) -> AiError {
        AiError::Api {
            status,
            code: code.map(String::from),
            message: "provider says no".to_string(),
        }
    }

    #[test]
    fn test_ai_error_categories() {
        let err = ai_error(api_error(429, Some("insufficient_quota")), "Failed to generate summary");
        assert_eq!(err.message, "AI service quota exceeded. Please check your OpenAI API limits.");
        assert_eq!(err.kind, ErrorKind::UpstreamGeneric);
        assert!(err.details.unwrap().contains("provider says no"));

        let err = ai_error(api_error(401, None), "Failed to generate summary");
        assert_eq!(err.message, "Invalid AI API key. Please check your OpenAI API configuration.");

        let err = ai_error(api_error(400, Some("invalid_api_key")), "x");
        assert_eq!(err.message, "Invalid AI API key. Please check your OpenAI API configuration.");

        let err = ai_error(api_error(503, None), "Failed to prioritize emails");
        assert_eq!(err.message, "Failed to prioritize emails");

        let err = ai_error(AiError::Format("element 2 has no reason".to_string()), "x");
        assert_eq!(err.kind, ErrorKind::UpstreamFormat);
        assert!(err.details.unwrap().contains("element 2"));
    }

    #[test]
    fn test_parse_emails() {
        let emails = parse_emails(&json!({"emails": [{"id": "m1", "snippet": null, "internalDate": 1700}]})).unwrap();
        assert_eq!(emails[0].id, "m1");
        assert_eq!(emails[0].internal_date, "1700");

        assert_eq!(parse_emails(&json!({})).unwrap_err().kind, ErrorKind::Validation);
        assert_eq!(parse_emails(&json!({"emails": "m1"})).unwrap_err().kind, ErrorKind::Validation);
        assert_eq!(parse_emails(&json!({"emails": [42]})).unwrap_err().kind, ErrorKind::Validation);
    }
}
