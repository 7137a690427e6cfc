//! Prompt templates for the AI endpoints

use inbox_assist_protocol::EmailMessage;

pub const SUMMARY_SYSTEM_PROMPT: &str = "You are an expert email assistant. Analyze the provided emails and create a concise, insightful summary.

Focus on:
- Key topics and themes across emails
- Urgent matters requiring attention
- Important senders or conversations
- Action items or next steps

Keep the summary under 250 words and make it easy to scan. Use bullet points if helpful.";

pub const PRIORITY_SYSTEM_PROMPT: &str = r#"You are an email priority classifier. Analyze each email and assign a priority level:

HIGH: Urgent emails requiring immediate attention
- Time-sensitive requests
- Important people (boss, clients, family)
- Critical business matters
- Deadline-driven content

MEDIUM: Important but not urgent
- Work discussions
- Project updates
- Important notifications

LOW: Non-urgent communications
- Newsletters
- Promotions
- Social notifications
- Automated emails

Respond with ONLY a valid JSON array. Each object must have:
- index (number)
- priority ("high", "medium", or "low")
- reason (brief explanation)

Example: [{"index": 0, "priority": "high", "reason": "Urgent client request"}]"#;

pub const COMPOSE_SYSTEM_PROMPT: &str = "You are a professional email writer. Generate complete, well-structured emails based on the given subject and tone. Include appropriate greetings and closings.";

const SUMMARY_PREVIEW_CHARS: usize = 200;
const PRIORITY_PREVIEW_CHARS: usize = 150;

/// User prompt for the summarizer. Emails are numbered from 1.
pub fn summary_prompt(emails: &[EmailMessage]) -> String {
    let content = emails
        .iter()
        .enumerate()
        .map(|(i, email)| {
            render_email(
                &format!("Email {}", i + 1),
                email,
                SUMMARY_PREVIEW_CHARS,
                "No content available",
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n");

    format!(
        "Please provide a smart summary of these recent emails:\n\n{}",
        content
    )
}

/// User prompt for the prioritizer. Emails are numbered from 0 so the
/// labels match the `index` the model must return.
pub fn priority_prompt(emails: &[EmailMessage]) -> String {
    let content = emails
        .iter()
        .enumerate()
        .map(|(i, email)| render_email(&format!("Email {}", i), email, PRIORITY_PREVIEW_CHARS, "No content"))
        .collect::<Vec<_>>()
        .join("\n");

    format!("Classify these emails by priority:\n\n{}", content)
}

/// User prompt for the composer.
pub fn compose_prompt(subject: &str, tone: &str, key_points: Option<&str>) -> String {
    match key_points {
        Some(points) => format!(
            "Write a {} email with subject: \"{}\"\nKey points to include: {}",
            tone, subject, points
        ),
        None => format!("Write a {} email with subject: \"{}\"", tone, subject),
    }
}

fn render_email(label: &str, email: &EmailMessage, preview_chars: usize, no_content: &str) -> String {
    let from = non_empty_or(&email.from, "Unknown Sender");
    let subject = non_empty_or(&email.subject, "No Subject");
    let preview = preview(email, preview_chars).unwrap_or_else(|| no_content.to_string());

    format!(
        "{}:\nFrom: {}\nSubject: {}\nPreview: {}\n---",
        label, from, subject, preview
    )
}

/// The snippet, else the first `limit` characters of the body.
fn preview(email: &EmailMessage, limit: usize) -> Option<String> {
    if !email.snippet.is_empty() {
        return Some(email.snippet.clone());
    }
    if !email.body.is_empty() {
        return Some(email.body.chars().take(limit).collect());
    }
    None
}

fn non_empty_or<'a>(value: &'a str, fallback: &'a str) -> &'a str {
    if value.is_empty() {
        fallback
    } else {
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn email(from: &str, subject: &str, snippet: &str, body: &str) -> EmailMessage {
        EmailMessage {
            from: from.to_string(),
            subject: subject.to_string(),
            snippet: snippet.to_string(),
            body: body.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_summary_prompt_numbers_from_one() {
        let prompt = summary_prompt(&[
            email("alice@example.com", "Lunch", "Are you free?", ""),
            email("", "", "", ""),
        ]);

        assert!(prompt.starts_with("Please provide a smart summary of these recent emails:\n\n"));
        assert!(prompt.contains("Email 1:\nFrom: alice@example.com\nSubject: Lunch\nPreview: Are you free?\n---"));
        assert!(prompt.contains("\n\nEmail 2:\nFrom: Unknown Sender\nSubject: No Subject\nPreview: No content available\n---"));
    }

    #[test]
    fn test_priority_prompt_numbers_from_zero() {
        let long_body = "é".repeat(400);
        let prompt = priority_prompt(&[email("a", "b", "", &long_body)]);

        assert!(prompt.contains("Email 0:\n"));
        let preview_line = prompt.lines().find(|l| l.starts_with("Preview: ")).unwrap();
        assert_eq!(preview_line.chars().count(), "Preview: ".len() + PRIORITY_PREVIEW_CHARS);
    }

    #[test]
    fn test_compose_prompt() {
        assert_eq!(
            compose_prompt("Offsite", "friendly", None),
            "Write a friendly email with subject: \"Offsite\""
        );
        assert_eq!(
            compose_prompt("Offsite", "formal", Some("date, venue")),
            "Write a formal email with subject: \"Offsite\"\nKey points to include: date, venue"
        );
    }
}
