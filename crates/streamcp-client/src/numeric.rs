//! Numeric results from tools that answer in prose.
//!
//! The MCP reference server's `add` tool replies with text such as
//! `"The sum of 2 and 3 is 5."` instead of structured content. This is a compatibility
//! shim for that server, not a protocol guarantee: structured content always wins, and
//! the text patterns below are tried strictly in order.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;
use streamcp_protocol::CallToolResult;

use crate::error::{McpClientError, Result};

const NUMBER: &str = r"[-+]?\d+(?:\.\d+)?(?:[eE][-+]?\d+)?";

/// Ordered prose patterns; the number is always capture group `n`.
static TEXT_PATTERNS: LazyLock<[Regex; 3]> = LazyLock::new(|| {
    [
        format!(r"(?i)\bthe sum of\s+{NUMBER}\s+and\s+{NUMBER}\s+is\s+(?P<n>{NUMBER})"),
        format!(r"(?i)\bis\s+(?P<n>{NUMBER})\s*\.?\s*$"),
        format!(r"(?i)(?:\bresult\s*[:=]|=)\s*(?P<n>{NUMBER})"),
    ]
    .map(|pattern| Regex::new(&pattern).expect("numeric result patterns are valid"))
});

/// Keys checked, in order, when structured content is an object.
const STRUCTURED_KEYS: [&str; 3] = ["result", "sum", "value"];

/// Extract a number from a tool result.
///
/// `structuredContent` is consulted first (a bare number, or an object with a numeric
/// `result`, `sum` or `value` field). Otherwise the joined text content goes through
/// [`parse_numeric_text`].
///
/// # Errors
///
/// Returns [`McpClientError::UnparsableResult`] when no strategy yields a number.
pub fn numeric_result(result: &CallToolResult) -> Result<f64> {
    if let Some(n) = result.structured_content.as_ref().and_then(structured_number) {
        return Ok(n);
    }
    parse_numeric_text(&result.text())
}

/// Parse a number out of free-form tool text.
///
/// Strategies, first match wins:
///
/// 1. `The sum of X and Y is Z`
/// 2. `... is Z` at the end of the text
/// 3. `result: Z`, `result = Z` or `= Z`
/// 4. the whole text is a number
///
/// # Errors
///
/// Returns [`McpClientError::UnparsableResult`] carrying the text when nothing matches.
pub fn parse_numeric_text(text: &str) -> Result<f64> {
    let trimmed = text.trim();

    TEXT_PATTERNS
        .iter()
        .find_map(|pattern| {
            pattern
                .captures(trimmed)
                .and_then(|caps| caps.name("n"))
                .and_then(|n| n.as_str().parse::<f64>().ok())
        })
        .or_else(|| trimmed.parse::<f64>().ok().filter(|n| n.is_finite()))
        .ok_or_else(|| McpClientError::UnparsableResult {
            text: text.to_string(),
        })
}

fn structured_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::Object(map) => STRUCTURED_KEYS
            .iter()
            .find_map(|key| map.get(*key).and_then(Value::as_f64)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use streamcp_protocol::Content;

    #[test]
    fn parses_reference_server_sentence() {
        assert_eq!(parse_numeric_text("The sum of 2 and 3 is 5.").unwrap(), 5.0);
        assert_eq!(
            parse_numeric_text("The sum of -1.5 and 4 is 2.5").unwrap(),
            2.5
        );
    }

    #[test]
    fn sum_sentence_wins_over_trailing_number() {
        // The first strategy must pick Z, not the operands.
        assert_eq!(
            parse_numeric_text("the sum of 10 and 20 is 30 (checked)").unwrap(),
            30.0
        );
    }

    #[test]
    fn falls_back_in_order() {
        assert_eq!(parse_numeric_text("The answer is 42").unwrap(), 42.0);
        assert_eq!(parse_numeric_text("Result: 7").unwrap(), 7.0);
        assert_eq!(parse_numeric_text("2 + 3 = 5").unwrap(), 5.0);
        assert_eq!(parse_numeric_text("  12.5 \n").unwrap(), 12.5);
    }

    #[test]
    fn unparsable_text_is_reported() {
        let err = parse_numeric_text("no digits here").unwrap_err();
        match err {
            McpClientError::UnparsableResult { text } => assert_eq!(text, "no digits here"),
            other => panic!("expected UnparsableResult, got {other:?}"),
        }
        assert!(parse_numeric_text("NaN").is_err());
    }

    #[test]
    fn structured_content_takes_precedence() {
        let result = CallToolResult {
            content: vec![Content::text("The sum of 2 and 3 is 6")],
            is_error: None,
            structured_content: Some(json!({"result": 5})),
        };
        assert_eq!(numeric_result(&result).unwrap(), 5.0);

        let bare = CallToolResult {
            structured_content: Some(json!(8)),
            ..Default::default()
        };
        assert_eq!(numeric_result(&bare).unwrap(), 8.0);
    }

    #[test]
    fn non_numeric_structured_content_falls_back_to_text() {
        let result = CallToolResult {
            content: vec![Content::text("The sum of 2 and 3 is 5.")],
            is_error: None,
            structured_content: Some(json!({"note": "prose only"})),
        };
        assert_eq!(numeric_result(&result).unwrap(), 5.0);
    }
}
