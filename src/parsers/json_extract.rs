// Tolerant JSON extraction from free-form model output

use regex::Regex;
use serde_json::Value;
use std::sync::OnceLock;

static FENCED_BLOCK: OnceLock<Regex> = OnceLock::new();

fn fenced_block() -> &'static Regex {
    FENCED_BLOCK.get_or_init(|| Regex::new(r"(?is)```(?:json)?\s*(.*?)\s*```").unwrap())
}

/// Isolate the JSON-looking part of an LLM response.
///
/// Resolution order:
/// 1. The first fenced block (optionally tagged `json`, any case) wins,
///    even when its content is itself malformed.
/// 2. Otherwise the first `{` or `[` is matched to its closing bracket by
///    depth counting. Only the bracket kind that opened the match is counted.
/// 3. If the match never closes, quote/backtick wrapping is stripped when the
///    whole text is wrapped in it; otherwise the trimmed text comes back as-is.
///
/// Never fails. The result may still be invalid JSON; callers validate.
pub fn extract_json(text: &str) -> String {
    let t = text.trim();

    if let Some(inner) = fenced_block().captures(t).and_then(|cap| cap.get(1)) {
        return inner.as_str().trim().to_string();
    }

    let Some((start, open_ch)) = t.char_indices().find(|(_, c)| *c == '{' || *c == '[') else {
        return t.to_string();
    };
    let close_ch = if open_ch == '{' { '}' } else { ']' };

    let mut depth = 0usize;
    for (i, ch) in t[start..].char_indices() {
        if ch == open_ch {
            depth += 1;
        } else if ch == close_ch {
            depth = depth.saturating_sub(1);
            if depth == 0 {
                let end = start + i + ch.len_utf8();
                return t[start..end].trim().to_string();
            }
        }
    }

    let wrapped = (t.starts_with('`') && t.ends_with('`'))
        || (t.starts_with('"') && t.ends_with('"'));
    if wrapped {
        return t
            .trim_matches(|c: char| matches!(c, '`' | '"' | '\'' | ' ' | '\n' | '\r' | '\t'))
            .to_string();
    }

    t.to_string()
}

/// Extract from an arbitrary JSON value. Only strings can carry a payload;
/// every other variant yields an empty string.
pub fn extract_json_value(value: &Value) -> String {
    match value {
        Value::String(s) => extract_json(s),
        _ => String::new(),
    }
}

/// Extract and parse in one step
pub fn parse_extracted(text: &str) -> Result<Value, serde_json::Error> {
    serde_json::from_str(&extract_json(text))
}
