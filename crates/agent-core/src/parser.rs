//! Response Parser
//!
//! Turns raw model text into a tagged reply, tolerating extraneous prose
//! around a JSON object. Two-stage decode: strict whole-string first, then
//! the first balanced `{...}` substring. Pure functions, testable in
//! isolation from any network call.

use serde_json::{Map, Value};

/// A tool call decoded from model output
#[derive(Clone, Debug, PartialEq)]
pub struct ToolCallRequest {
    /// Function name; must match a registered tool or dispatch is a no-op
    pub function: String,

    /// Arguments mapping, always coerced to an object
    pub arguments: Map<String, Value>,
}

/// Result of parsing one phase of model output
#[derive(Clone, Debug, PartialEq)]
pub enum ModelReply {
    /// Model chose a tool
    FunctionCall(ToolCallRequest),

    /// Model answered directly in natural language
    DirectText(String),

    /// A JSON candidate was present but not decodable; the orchestrator
    /// degrades this to `DirectText` of the trimmed raw text
    ParseFailure,
}

/// Parse raw model output.
///
/// When tools were not offered (phase 2), the output is always taken
/// verbatim as direct text with no JSON attempt.
pub fn parse(raw_text: &str, tools_were_offered: bool) -> ModelReply {
    if !tools_were_offered {
        return ModelReply::DirectText(raw_text.trim().to_string());
    }

    // Strict whole-string decode first
    if let Ok(Value::Object(obj)) = serde_json::from_str::<Value>(raw_text.trim()) {
        return classify(&obj, raw_text);
    }

    // Then the first balanced object substring
    match first_json_object(raw_text) {
        Some(candidate) => match serde_json::from_str::<Value>(candidate) {
            Ok(Value::Object(obj)) => classify(&obj, raw_text),
            _ => ModelReply::ParseFailure,
        },
        None => ModelReply::DirectText(raw_text.trim().to_string()),
    }
}

/// Classify a decoded object as a function call or direct text.
fn classify(obj: &Map<String, Value>, raw_text: &str) -> ModelReply {
    match obj.get("function") {
        Some(value) if !value.is_null() => {
            let function = match value {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            ModelReply::FunctionCall(ToolCallRequest {
                function,
                arguments: coerce_arguments(obj.get("arguments")),
            })
        }
        // No usable function key: direct text, preferring an explicit
        // "text" field over the raw output
        _ => {
            let text = obj
                .get("text")
                .and_then(Value::as_str)
                .unwrap_or_else(|| raw_text.trim());
            ModelReply::DirectText(text.trim().to_string())
        }
    }
}

/// Coerce an `arguments` value to a mapping: absent becomes `{}`; a
/// JSON-encoded mapping string is decoded; anything else becomes `{}`.
fn coerce_arguments(value: Option<&Value>) -> Map<String, Value> {
    match value {
        Some(Value::Object(map)) => map.clone(),
        Some(Value::String(encoded)) => match serde_json::from_str::<Value>(encoded) {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        },
        _ => Map::new(),
    }
}

/// Find the first balanced `{...}` substring, honoring JSON string
/// literals and escapes so braces inside strings do not count.
fn first_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, c) in text[start..].char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..start + offset + c.len_utf8()]);
                }
            }
            _ => {}
        }
    }

    None
}
