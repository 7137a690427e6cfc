//! Shared utilities for Google API modules

use serde_json::Value;

/// Extract an array field from a JSON response, returning an empty vec if missing.
///
/// Gmail omits the list field entirely when there is nothing to return
/// (an empty inbox has no "messages" key), so absence is not an error.
pub fn extract_array(response: &Value, field: &str) -> Vec<Value> {
    response
        .get(field)
        .and_then(|v| v.as_array())
        .cloned()
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_extract_array_missing_field() {
        assert!(extract_array(&json!({"resultSizeEstimate": 0}), "messages").is_empty());
        assert_eq!(extract_array(&json!({"messages": [{"id": "a"}]}), "messages").len(), 1);
    }
}
