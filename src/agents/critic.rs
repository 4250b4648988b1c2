// Critic: asks the model to assess experiment results

use serde::Serialize;
use serde_json::ser::Formatter;
use serde_json::Value;
use std::io;

use super::{prompts, value_text, AgentContext, AgentOutcome};
use crate::llm::LlmRequest;
use crate::models::Critique;
use crate::parsers::parse_extracted;
use crate::utils::truncate_chars;

pub struct Critic {
    ctx: AgentContext,
    context_chars: usize,
}

impl Critic {
    pub fn new(ctx: AgentContext) -> Self {
        Self {
            ctx,
            context_chars: 1000,
        }
    }

    /// How many characters of serialized results the model sees
    pub fn with_context_chars(mut self, context_chars: usize) -> Self {
        self.context_chars = context_chars;
        self
    }

    pub async fn run(&self, results: &Value) -> AgentOutcome<Critique> {
        let events = &self.ctx.events;
        events.log("Critic: evaluating results using LLM...");

        let serialized = results_text(results);
        let excerpt = truncate_chars(&serialized, self.context_chars);

        let raw = self
            .ctx
            .llm
            .generate(&LlmRequest::new(prompts::critic(excerpt)))
            .await;
        events.log("Critic: LLM response received");

        match parse_critique(&raw) {
            Ok(critique) => AgentOutcome::parsed(critique),
            Err(reason) => {
                events.log(format!("Critic: JSON parse failed: {}", reason));
                AgentOutcome::fallback(Critique::fallback(), reason)
            }
        }
    }
}

fn parse_critique(raw: &str) -> Result<Critique, String> {
    if raw.trim().is_empty() {
        return Err("empty response".to_string());
    }

    let parsed = parse_extracted(raw).map_err(|e| e.to_string())?;
    let critique = present(&parsed, "critique")?;
    let confidence = present(&parsed, "confidence")?;

    Ok(Critique {
        critique: value_text(critique),
        confidence: coerce_confidence(confidence),
    })
}

fn present<'a>(parsed: &'a Value, key: &str) -> Result<&'a Value, String> {
    match parsed.get(key) {
        None | Some(Value::Null) => Err(format!("missing '{}' key", key)),
        Some(value) => Ok(value),
    }
}

/// Numbers, numeric strings and booleans (1.0 / 0.0) are accepted; anything
/// else becomes the default
pub fn coerce_confidence(value: &Value) -> f64 {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        _ => None,
    }
    .unwrap_or(Critique::DEFAULT_CONFIDENCE)
}

/// Single-line JSON with `", "` / `": "` separators and non-ASCII escaped as
/// `\uXXXX`, the layout the critic prompt window is measured against
struct SpacedAsciiFormatter;

impl Formatter for SpacedAsciiFormatter {
    fn begin_array_value<W: ?Sized + io::Write>(&mut self, writer: &mut W, first: bool) -> io::Result<()> {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_key<W: ?Sized + io::Write>(&mut self, writer: &mut W, first: bool) -> io::Result<()> {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_value<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        writer.write_all(b": ")
    }

    fn write_string_fragment<W: ?Sized + io::Write>(&mut self, writer: &mut W, fragment: &str) -> io::Result<()> {
        for ch in fragment.chars() {
            if ch.is_ascii() {
                writer.write_all(&[ch as u8])?;
            } else {
                let mut units = [0u16; 2];
                for unit in ch.encode_utf16(&mut units) {
                    write!(writer, "\\u{:04x}", unit)?;
                }
            }
        }
        Ok(())
    }
}

/// Serialized results as shown to the critic
pub fn results_text(results: &Value) -> String {
    let mut buf = Vec::new();
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, SpacedAsciiFormatter);
    match results.serialize(&mut serializer) {
        Ok(()) => String::from_utf8(buf).unwrap_or_else(|_| results.to_string()),
        Err(e) => {
            log::warn!("Falling back to compact results text: {}", e);
            results.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::test_support::context_with;
    use crate::llm::testing::ScriptedModel;
    use serde_json::json;

    #[tokio::test]
    async fn test_parses_critique() {
        let response = r#"```json
{"critique": "Too few rows.", "confidence": 0.4}
```"#;
        let (ctx, _) = context_with(ScriptedModel::new([response]));

        let outcome = Critic::new(ctx).run(&json!({"summary": {"accuracy": 1.0}})).await;
        assert!(!outcome.is_fallback());
        assert_eq!(
            outcome.value,
            Critique {
                critique: "Too few rows.".to_string(),
                confidence: 0.4
            }
        );
    }

    #[tokio::test]
    async fn test_empty_response_is_exact_fallback() {
        let (ctx, _) = context_with(ScriptedModel::new([""]));

        let outcome = Critic::new(ctx).run(&json!({})).await;
        assert!(outcome.is_fallback());
        assert_eq!(
            serde_json::to_value(&outcome.value).unwrap(),
            json!({"critique": "Fallback critique", "confidence": 0.7})
        );
    }

    #[tokio::test]
    async fn test_missing_key_is_fallback() {
        let (ctx, _) = context_with(ScriptedModel::new([r#"{"critique": "ok"}"#]));
        let outcome = Critic::new(ctx).run(&json!({})).await;
        assert_eq!(outcome.value, Critique::fallback());
        assert_eq!(outcome.fallback_reason(), Some("missing 'confidence' key"));
    }

    #[tokio::test]
    async fn test_uncoercible_confidence_defaults() {
        let (ctx, _) = context_with(ScriptedModel::new([
            r#"{"critique": "fine", "confidence": "high"}"#,
        ]));
        let outcome = Critic::new(ctx).run(&json!({})).await;
        assert!(!outcome.is_fallback());
        assert_eq!(outcome.value.critique, "fine");
        assert_eq!(outcome.value.confidence, 0.7);
    }

    #[tokio::test]
    async fn test_prompt_sees_truncated_results() {
        let long = "x".repeat(5000);
        let (ctx, model) = context_with(ScriptedModel::default());

        Critic::new(ctx)
            .with_context_chars(50)
            .run(&json!({"blob": long}))
            .await;

        let prompt = &model.prompts()[0];
        let expected = format!("{{\"blob\": \"{}", "x".repeat(40));
        assert!(prompt.contains(&format!("results: {}.", expected)));
        assert!(!prompt.contains(&"x".repeat(41)));
    }

    #[test]
    fn test_coerce_confidence() {
        assert_eq!(coerce_confidence(&json!(0.9)), 0.9);
        assert_eq!(coerce_confidence(&json!(1)), 1.0);
        assert_eq!(coerce_confidence(&json!(" 0.25 ")), 0.25);
        assert_eq!(coerce_confidence(&json!([0.1])), 0.7);
        assert_eq!(coerce_confidence(&json!(true)), 1.0);
        assert_eq!(coerce_confidence(&json!(false)), 0.0);
        assert_eq!(coerce_confidence(&json!(null)), 0.7);
    }

    #[test]
    fn test_results_text_uses_spaced_separators() {
        let results = json!({"accuracy": 0.75, "data": [1, 2], "note": "caf\u{e9}"});
        assert_eq!(
            results_text(&results),
            r#"{"accuracy": 0.75, "data": [1, 2], "note": "caf\u00e9"}"#
        );
        assert_eq!(results_text(&json!({"q": "a\"b"})), r#"{"q": "a\"b"}"#);
        assert_eq!(results_text(&json!([])), "[]");
    }

    #[test]
    fn test_non_string_critique_is_stringified() {
        let critique = parse_critique(r#"{"critique": ["a", "b"], "confidence": 0.5}"#).unwrap();
        assert_eq!(critique.critique, "[\"a\",\"b\"]");
    }
}
