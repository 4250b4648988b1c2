// Question generator: turns domain names into testable research questions

use serde_json::Value;

use super::{prompts, value_text, AgentContext, AgentOutcome};
use crate::llm::LlmRequest;
use crate::parsers::parse_extracted;

pub fn fallback_questions() -> Vec<String> {
    (1..=3).map(|n| format!("Fallback question {}", n)).collect()
}

pub struct QuestionGenerator {
    ctx: AgentContext,
}

impl QuestionGenerator {
    pub fn new(ctx: AgentContext) -> Self {
        Self { ctx }
    }

    /// Questions for `domains`. Entries that are not objects with a `name`
    /// are skipped when building the prompt.
    ///
    /// A parsed list whose items are all blank yields an empty result, not
    /// the fallback.
    pub async fn run(&self, domains: &[Value]) -> AgentOutcome<Vec<String>> {
        let events = &self.ctx.events;
        events.log("QuestionGenerator: generating questions...");

        let names = domain_names(domains);
        let raw = self
            .ctx
            .llm
            .generate(&LlmRequest::new(prompts::question_generator(&names)))
            .await;
        events.log("QuestionGenerator: LLM response received");

        match parse_questions(&raw) {
            Ok(questions) => AgentOutcome::parsed(questions),
            Err(reason) => {
                events.log(format!("QuestionGenerator: JSON parse failed: {}", reason));
                AgentOutcome::fallback(fallback_questions(), reason)
            }
        }
    }
}

/// `name` of every entry that is an object containing that key
pub fn domain_names(domains: &[Value]) -> Vec<String> {
    domains
        .iter()
        .filter_map(|d| d.as_object()?.get("name"))
        .map(value_text)
        .collect()
}

fn parse_questions(raw: &str) -> Result<Vec<String>, String> {
    if raw.trim().is_empty() {
        return Err("empty response".to_string());
    }

    let parsed = parse_extracted(raw).map_err(|e| e.to_string())?;
    match parsed.get("questions") {
        Some(Value::Array(items)) if !items.is_empty() => Ok(items
            .iter()
            .filter_map(Value::as_str)
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .map(str::to_string)
            .collect()),
        Some(Value::Array(_)) => Err("'questions' is empty".to_string()),
        Some(_) => Err("'questions' is not a list".to_string()),
        None => Err("missing 'questions' key".to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::test_support::context_with;
    use crate::llm::testing::ScriptedModel;
    use serde_json::json;

    #[tokio::test]
    async fn test_only_named_entries_reach_prompt() {
        let domains = vec![
            json!({"name": "X", "confidence": 0.5}),
            json!({"foo": "bar"}),
            json!("not a mapping"),
        ];
        let (ctx, model) =
            context_with(ScriptedModel::new([r#"{"questions": ["Does X hold?"]}"#]));

        let outcome = QuestionGenerator::new(ctx).run(&domains).await;
        assert_eq!(outcome.value, vec!["Does X hold?".to_string()]);

        let prompts = model.prompts();
        assert!(prompts[0].contains("[\"X\"]"));
        assert!(!prompts[0].contains("bar"));
    }

    #[tokio::test]
    async fn test_trims_and_drops_blank_questions() {
        let response = r#"```json
{"questions": ["  q1  ", "", 7, "q2"]}
```"#;
        let (ctx, _) = context_with(ScriptedModel::new([response]));

        let outcome = QuestionGenerator::new(ctx).run(&[]).await;
        assert!(!outcome.is_fallback());
        assert_eq!(outcome.value, vec!["q1".to_string(), "q2".to_string()]);
    }

    #[tokio::test]
    async fn test_all_blank_questions_yield_empty_list() {
        let (ctx, _) = context_with(ScriptedModel::new([r#"{"questions": ["  ", ""]}"#]));

        let outcome = QuestionGenerator::new(ctx).run(&[]).await;
        assert!(!outcome.is_fallback());
        assert!(outcome.value.is_empty());
    }

    #[tokio::test]
    async fn test_malformed_response_uses_fallback() {
        let (ctx, _) = context_with(ScriptedModel::new(["I cannot help with that"]));

        let outcome = QuestionGenerator::new(ctx).run(&[json!({"name": "X"})]).await;
        assert!(outcome.is_fallback());
        assert_eq!(outcome.value, fallback_questions());
        assert_eq!(outcome.value[0], "Fallback question 1");
    }

    #[test]
    fn test_domain_names_stringifies_non_string_names() {
        let names = domain_names(&[json!({"name": 42}), json!({"name": "Y"})]);
        assert_eq!(names, vec!["42".to_string(), "Y".to_string()]);
    }
}
