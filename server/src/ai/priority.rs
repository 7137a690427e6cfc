//! Validation of the prioritizer's model output

use inbox_assist_protocol::{Priority, PriorityAssignment};
use serde_json::Value;

use super::client::AiError;

/// Parse the model's reply into priority assignments.
///
/// The reply must be a JSON array whose every element carries a
/// non-negative integer `index`, a `priority` of `high`, `medium` or
/// `low`, and a string `reason`. One bad element rejects the whole batch.
pub fn parse_priorities(text: &str) -> Result<Vec<PriorityAssignment>, AiError> {
    let value: Value = serde_json::from_str(strip_code_fence(text))
        .map_err(|e| AiError::Format(format!("response is not valid JSON ({})", e)))?;

    let items = value
        .as_array()
        .ok_or_else(|| AiError::Format("expected a JSON array".to_string()))?;

    items
        .iter()
        .enumerate()
        .map(|(position, item)| parse_assignment(position, item))
        .collect()
}

fn parse_assignment(position: usize, item: &Value) -> Result<PriorityAssignment, AiError> {
    let invalid = |what: &str| AiError::Format(format!("element {} {}", position, what));

    if !item.is_object() {
        return Err(invalid("is not an object"));
    }

    let index = item
        .get("index")
        .and_then(as_index)
        .ok_or_else(|| invalid("has no valid index"))?;

    let priority = item
        .get("priority")
        .and_then(|v| v.as_str())
        .and_then(Priority::parse)
        .ok_or_else(|| invalid("has an invalid priority"))?;

    let reason = item
        .get("reason")
        .and_then(|v| v.as_str())
        .ok_or_else(|| invalid("has no reason"))?
        .to_string();

    Ok(PriorityAssignment {
        index,
        priority,
        reason,
    })
}

/// Accepts `3` and `3.0`, rejects negatives, fractions and strings.
fn as_index(value: &Value) -> Option<usize> {
    if let Some(n) = value.as_u64() {
        return usize::try_from(n).ok();
    }
    let f = value.as_f64()?;
    if f >= 0.0 && f.fract() == 0.0 && f <= u32::MAX as f64 {
        Some(f as usize)
    } else {
        None
    }
}

/// Models sometimes wrap JSON in a markdown fence.
fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}
