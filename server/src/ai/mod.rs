//! AI assistance over OpenAI chat completions
//!
//! Summarize, prioritize and compose. Each operation is one completion
//! call with a fixed system prompt.

pub mod client;
pub mod priority;
pub mod prompts;

pub use client::{AiError, Completion, OpenAiClient};

use inbox_assist_protocol::{ComposeResponse, EmailMessage, PriorityResponse, SummaryResponse};
use tracing::info;

/// Only the newest emails are summarized.
pub const SUMMARY_EMAIL_LIMIT: usize = 10;

pub const DEFAULT_TONE: &str = "professional";

/// Summarize up to `SUMMARY_EMAIL_LIMIT` emails.
pub async fn summarize(client: &OpenAiClient, emails: &[EmailMessage]) -> Result<SummaryResponse, AiError> {
    let batch = &emails[..emails.len().min(SUMMARY_EMAIL_LIMIT)];
    info!("Summarizing {} of {} emails", batch.len(), emails.len());

    let summary = client
        .complete(&Completion {
            system: prompts::SUMMARY_SYSTEM_PROMPT,
            user: prompts::summary_prompt(batch),
            max_tokens: 400,
            temperature: 0.7,
        })
        .await?;

    Ok(SummaryResponse {
        summary: summary.trim().to_string(),
        emails_processed: batch.len(),
    })
}

/// Classify every email. Assignments refer to positions in `emails`.
pub async fn prioritize(client: &OpenAiClient, emails: &[EmailMessage]) -> Result<PriorityResponse, AiError> {
    info!("Prioritizing {} emails", emails.len());

    let text = client
        .complete(&Completion {
            system: prompts::PRIORITY_SYSTEM_PROMPT,
            user: prompts::priority_prompt(emails),
            max_tokens: 1500,
            temperature: 0.3,
        })
        .await?;

    let priorities = priority::parse_priorities(&text)?;
    Ok(PriorityResponse {
        total_classified: priorities.len(),
        priorities,
    })
}

/// Draft an email body for `subject`.
pub async fn compose(
    client: &OpenAiClient,
    subject: &str,
    tone: Option<&str>,
    key_points: Option<&str>,
) -> Result<ComposeResponse, AiError> {
    let tone = tone.map(str::trim).filter(|t| !t.is_empty()).unwrap_or(DEFAULT_TONE);
    let key_points = key_points.map(str::trim).filter(|k| !k.is_empty());
    info!("Composing {} email", tone);

    let email = client
        .complete(&Completion {
            system: prompts::COMPOSE_SYSTEM_PROMPT,
            user: prompts::compose_prompt(subject, tone, key_points),
            max_tokens: 500,
            temperature: 0.8,
        })
        .await?;

    let email = email.trim();
    if email.is_empty() {
        return Err(AiError::EmptyResponse);
    }

    Ok(ComposeResponse {
        email: email.to_string(),
        subject: subject.to_string(),
    })
}
