//! JSON object extraction from raw model output.

use serde_json::Value;

/// Pull a JSON object out of model text.
///
/// Tries a full-text parse first; text that parses to a non-object (array,
/// string, number) is absence, with no further attempt. If the full parse
/// fails, the widest `{...}` span (first `{` to last `}`) is parsed instead.
/// Absence is a normal outcome -- callers supply their own default.
pub fn extract_json(text: &str) -> Option<Value> {
    if text.trim().is_empty() {
        return None;
    }

    if let Ok(value) = serde_json::from_str::<Value>(text) {
        return value.is_object().then_some(value);
    }

    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end <= start {
        return None;
    }
    let value = serde_json::from_str::<Value>(&text[start..=end]).ok()?;
    value.is_object().then_some(value)
}
