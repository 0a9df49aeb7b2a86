//! Answer-text extraction from loosely shaped chat responses.
//!
//! The backend's response shape is not fully stable: depending on the model
//! route, the answer may arrive as a top-level `response` string, a raw
//! string payload, or an OpenAI-style completion object. The precedence
//! order below decides which text is shown to the user and must not change.

use serde_json::Value;

/// One extraction strategy: returns the answer text if this shape matches.
type Strategy = fn(&Value) -> Option<&str>;

/// Ordered extraction strategies, tried in sequence against the payload.
/// The first non-empty match wins.
const STRATEGIES: &[Strategy] = &[
    raw_string,
    content_field,
    message_field,
    first_choice_text,
    first_choice_message_content,
];

/// Extract the answer text from a parsed chat response body.
///
/// The primary text field is the top-level `response` string. When it is
/// absent or empty, the fallback chain runs against `assistant_response`
/// (or, failing that, the body itself). If every strategy yields empty
/// text the result is an empty string, never an error.
pub fn extract_answer_text(body: &Value) -> String {
    if let Some(Value::String(s)) = body.get("response") {
        if !s.is_empty() {
            return s.clone();
        }
    }

    let payload = body.get("assistant_response").unwrap_or(body);
    for strategy in STRATEGIES {
        if let Some(text) = strategy(payload) {
            if !text.is_empty() {
                return text.to_string();
            }
        }
    }
    String::new()
}

fn raw_string(payload: &Value) -> Option<&str> {
    payload.as_str()
}

fn content_field(payload: &Value) -> Option<&str> {
    payload.get("content")?.as_str()
}

fn message_field(payload: &Value) -> Option<&str> {
    payload.get("message")?.as_str()
}

fn first_choice(payload: &Value) -> Option<&Value> {
    payload.get("choices")?.as_array()?.first()
}

fn first_choice_text(payload: &Value) -> Option<&str> {
    first_choice(payload)?.get("text")?.as_str()
}

fn first_choice_message_content(payload: &Value) -> Option<&str> {
    first_choice(payload)?.get("message")?.get("content")?.as_str()
}
