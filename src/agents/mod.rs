// Research agents
//
// Each agent performs one pipeline stage. LLM-backed agents never return an
// error: any failure produces a fixed fallback value, and the outcome records
// which path was taken.

pub mod classifier;
pub mod critic;
pub mod data_alchemist;
pub mod domain_scout;
pub mod experiment_designer;
pub mod prompts;
pub mod question_generator;

pub use critic::Critic;
pub use data_alchemist::DataAlchemist;
pub use domain_scout::DomainScout;
pub use experiment_designer::ExperimentDesigner;
pub use question_generator::QuestionGenerator;

use std::sync::Arc;

use crate::llm::LanguageModel;
use crate::memory::MemoryStore;
use crate::pipeline::RunEventSink;

/// Shared dependencies handed to every agent
#[derive(Clone)]
pub struct AgentContext {
    pub memory: Arc<MemoryStore>,
    pub llm: Arc<dyn LanguageModel>,
    pub events: RunEventSink,
}

impl AgentContext {
    /// Context with a no-op event sink
    pub fn new(memory: Arc<MemoryStore>, llm: Arc<dyn LanguageModel>) -> Self {
        Self {
            memory,
            llm,
            events: RunEventSink::noop(),
        }
    }

    pub fn with_events(mut self, events: RunEventSink) -> Self {
        self.events = events;
        self
    }
}

/// Which path produced an agent's value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutcomeSource {
    /// The agent's primary computation succeeded
    Parsed,
    /// A hardcoded fallback was substituted
    Fallback { reason: String },
}

/// Agent result plus the path that produced it
#[derive(Debug, Clone, PartialEq)]
pub struct AgentOutcome<T> {
    pub value: T,
    pub source: OutcomeSource,
}

impl<T> AgentOutcome<T> {
    pub fn parsed(value: T) -> Self {
        Self {
            value,
            source: OutcomeSource::Parsed,
        }
    }

    pub fn fallback(value: T, reason: impl Into<String>) -> Self {
        Self {
            value,
            source: OutcomeSource::Fallback {
                reason: reason.into(),
            },
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self.source, OutcomeSource::Fallback { .. })
    }

    /// Diagnostic for a fallback outcome
    pub fn fallback_reason(&self) -> Option<&str> {
        match &self.source {
            OutcomeSource::Fallback { reason } => Some(reason),
            OutcomeSource::Parsed => None,
        }
    }

    pub fn into_value(self) -> T {
        self.value
    }
}

/// Render a JSON value as plain text: strings unquoted, everything else as JSON
pub(crate) fn value_text(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_outcome_sources() {
        let parsed = AgentOutcome::parsed(1);
        assert!(!parsed.is_fallback());
        assert_eq!(parsed.fallback_reason(), None);

        let fallback = AgentOutcome::fallback(2, "empty response");
        assert!(fallback.is_fallback());
        assert_eq!(fallback.fallback_reason(), Some("empty response"));
        assert_eq!(fallback.into_value(), 2);
    }

    #[test]
    fn test_value_text() {
        assert_eq!(value_text(&json!("plain")), "plain");
        assert_eq!(value_text(&json!(3)), "3");
        assert_eq!(value_text(&json!({"a": 1})), "{\"a\":1}");
    }
}
