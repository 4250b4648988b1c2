//! Shared helpers for integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use agentic_research_lib::config::PipelineConfig;
use agentic_research_lib::events::EventBroadcaster;
use agentic_research_lib::llm::{LanguageModel, LlmRequest};
use agentic_research_lib::pipeline::Orchestrator;
use agentic_research_lib::server::{build_router, ServerAppState};
use agentic_research_lib::RunPhase;

pub const SCOUT_RESPONSE: &str = r#"Sure! ```json
{"domains": [{"name": "Astronomy", "confidence": 0.9}, {"name": "Ecology", "confidence": 0.4}]}
```"#;

pub const QUESTIONS_RESPONSE: &str =
    r#"{"questions": ["Does stellar mass predict flare rate?", "Second question"]}"#;

pub const CRITIC_RESPONSE: &str = r#"Verdict: {"critique": "Small sample", "confidence": 0.55}"#;

/// Replays canned responses in order, then answers "" forever
#[derive(Default)]
pub struct ScriptedModel {
    responses: Mutex<VecDeque<String>>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedModel {
    pub fn new<I, S>(responses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            responses: Mutex::new(responses.into_iter().map(Into::into).collect()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl LanguageModel for ScriptedModel {
    async fn generate(&self, request: &LlmRequest) -> String {
        self.prompts.lock().unwrap().push(request.prompt.clone());
        self.responses.lock().unwrap().pop_front().unwrap_or_default()
    }
}

/// Pipeline settings without the artificial alchemist delay
pub fn fast_settings() -> PipelineConfig {
    PipelineConfig {
        alchemist_delay_ms: 0,
        ..PipelineConfig::default()
    }
}

pub fn orchestrator_with(model: Arc<ScriptedModel>) -> Arc<Orchestrator> {
    Arc::new(Orchestrator::new(model, fast_settings()))
}

pub fn test_app(model: Arc<ScriptedModel>) -> (axum::Router, Arc<Orchestrator>) {
    let broadcaster = Arc::new(EventBroadcaster::new());
    let orchestrator = Arc::new(
        Orchestrator::new(model, fast_settings()).with_broadcaster(broadcaster.clone()),
    );
    let state = ServerAppState::new(orchestrator.clone(), broadcaster);
    (build_router(state, None), orchestrator)
}

/// Poll until the run leaves `initialized`
pub async fn wait_for_terminal(orchestrator: &Orchestrator, run_id: &str) -> RunPhase {
    for _ in 0..200 {
        if let Some(status) = orchestrator.get_status(run_id) {
            if status.phase != RunPhase::Initialized {
                return status.phase;
            }
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("run {} did not finish", run_id);
}
