//! Run orchestrator
//!
//! `start` allocates a run and spawns its pipeline as a supervised task:
//! the pipeline body runs in its own task and a supervisor awaits it, so an
//! error or a panic anywhere in the body ends the run in `error` with no
//! paper. Every supervisor handle is tracked and can be awaited with
//! `wait` / `join_all`. Runs are never cancelled or retried.

use chrono::Utc;
use serde_json::{json, Value};
use std::any::Any;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;

use super::{PipelineError, RunEventSink, RunRegistry};
use crate::agents::{
    AgentContext, Critic, DataAlchemist, DomainScout, ExperimentDesigner, QuestionGenerator,
};
use crate::config::PipelineConfig;
use crate::events::EventBroadcaster;
use crate::llm::LanguageModel;
use crate::memory::MemoryStore;
use crate::models::{Dataset, ExperimentResult, Paper, RunMode, RunPhase, RunStatus};
use crate::utils::lock_mutex_recover;

/// Question token used by the simulate pipeline
pub const SIMULATION_PROMPT: &str = "simulate_experiment";

pub const SUMMARY_PLACEHOLDER_TITLE: &str = "Summarized Paper (placeholder)";
pub const SUMMARY_PLACEHOLDER_ABSTRACT: &str = "This is an auto-generated summary (placeholder).";

pub struct Orchestrator {
    registry: Arc<RunRegistry>,
    memory: Arc<MemoryStore>,
    llm: Arc<dyn LanguageModel>,
    broadcaster: Option<Arc<EventBroadcaster>>,
    settings: PipelineConfig,
    tasks: Mutex<HashMap<String, JoinHandle<()>>>,
}

impl Orchestrator {
    pub fn new(llm: Arc<dyn LanguageModel>, settings: PipelineConfig) -> Self {
        Self {
            registry: Arc::new(RunRegistry::with_max_retained(settings.max_retained_runs)),
            memory: Arc::new(MemoryStore::new()),
            llm,
            broadcaster: None,
            settings,
            tasks: Mutex::new(HashMap::new()),
        }
    }

    /// Publish run logs and phase changes through `broadcaster`
    pub fn with_broadcaster(mut self, broadcaster: Arc<EventBroadcaster>) -> Self {
        self.broadcaster = Some(broadcaster);
        self
    }

    pub fn registry(&self) -> &Arc<RunRegistry> {
        &self.registry
    }

    /// Memory shared by every run
    pub fn memory(&self) -> &Arc<MemoryStore> {
        &self.memory
    }

    /// Start a run and return its id immediately. Must be called from
    /// within a tokio runtime.
    pub fn start(&self, mode: &str) -> String {
        let run_id = self.registry.create(mode);
        let events = RunEventSink::new(
            run_id.clone(),
            self.registry.clone(),
            self.broadcaster.clone(),
        );
        events.phase(RunPhase::Initialized, mode);

        let job = PipelineJob {
            run_id: run_id.clone(),
            mode: mode.to_string(),
            ctx: AgentContext::new(self.memory.clone(), self.llm.clone())
                .with_events(events.clone()),
            settings: self.settings.clone(),
        };
        let handle = tokio::spawn(supervise(job, self.registry.clone(), events));

        let mut tasks = lock_mutex_recover(&self.tasks);
        tasks.retain(|_, handle| !handle.is_finished());
        tasks.insert(run_id.clone(), handle);

        log::info!("Started run {} (mode={})", run_id, mode);
        run_id
    }

    /// Wait for one run to reach a terminal phase
    pub async fn wait(&self, run_id: &str) {
        let handle = lock_mutex_recover(&self.tasks).remove(run_id);
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                log::error!("Supervisor for run {} failed: {}", run_id, e);
            }
        }
    }

    /// Wait for every tracked run
    pub async fn join_all(&self) {
        let handles: Vec<JoinHandle<()>> = lock_mutex_recover(&self.tasks)
            .drain()
            .map(|(_, handle)| handle)
            .collect();
        if handles.is_empty() {
            return;
        }

        log::info!("Waiting for {} pipeline task(s)", handles.len());
        for result in futures_util::future::join_all(handles).await {
            if let Err(e) = result {
                log::error!("Pipeline supervisor failed: {}", e);
            }
        }
    }

    /// Runs whose pipeline has not finished yet
    pub fn in_flight(&self) -> usize {
        lock_mutex_recover(&self.tasks)
            .values()
            .filter(|handle| !handle.is_finished())
            .count()
    }

    pub fn get_status(&self, run_id: &str) -> Option<RunStatus> {
        self.registry.status(run_id)
    }

    /// The paper of a completed run
    pub fn get_result(&self, run_id: &str) -> Option<Paper> {
        self.registry.paper(run_id)
    }
}

async fn supervise(job: PipelineJob, registry: Arc<RunRegistry>, events: RunEventSink) {
    let run_id = job.run_id.clone();
    let mode = job.mode.clone();

    let outcome = match tokio::spawn(job.execute()).await {
        Ok(outcome) => outcome,
        Err(e) if e.is_panic() => Err(PipelineError::Panicked(panic_message(e.into_panic()))),
        Err(_) => Err(PipelineError::Cancelled),
    };

    match outcome {
        Ok(paper) => match registry.complete(&run_id, paper) {
            Ok(()) => events.phase(RunPhase::Completed, &mode),
            Err(e) => log::error!("Could not complete run {}: {}", run_id, e),
        },
        Err(error) => {
            log::error!("Run {} failed: {}", run_id, error);
            let message = format!("Pipeline error: {:?}", error);
            match registry.fail(&run_id, message.clone()) {
                Ok(index) => {
                    events.publish_log(index, message);
                    events.phase(RunPhase::Error, &mode);
                }
                Err(e) => log::error!("Could not record failure of run {}: {}", run_id, e),
            }
        }
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Everything one pipeline body needs, owned so it can move into a task
struct PipelineJob {
    run_id: String,
    /// Mode string as supplied by the caller
    mode: String,
    ctx: AgentContext,
    settings: PipelineConfig,
}

impl PipelineJob {
    async fn execute(self) -> Result<Paper, PipelineError> {
        self.ctx
            .events
            .log(format!("Starting pipeline (mode={})", self.mode));

        match RunMode::parse(&self.mode) {
            RunMode::Explore => self.explore().await,
            RunMode::Summarize => Ok(self.summarize()),
            RunMode::Simulate => self.simulate().await,
            RunMode::Default => self.full().await,
        }
    }

    async fn explore(&self) -> Result<Paper, PipelineError> {
        let events = &self.ctx.events;

        let (domains, questions) = self.scout_and_ask().await?;
        let chosen = questions
            .first()
            .cloned()
            .unwrap_or_else(|| "Exploration result".to_string());
        events.log(format!("Chosen question: {}", chosen));

        let paper = Paper::new(
            format!("Exploration: {}", chosen),
            "Auto-generated exploration summary.",
        )
        .with_results(json!({"domains": domains, "questions": questions}))
        .with_meta(self.meta());

        events.log("Explore pipeline finished");
        Ok(paper)
    }

    fn summarize(&self) -> Paper {
        // Content ingestion does not exist; the paper is a fixed placeholder
        let events = &self.ctx.events;
        events.log("Summarization mode: running placeholder summarizer");
        let paper = Paper::new(SUMMARY_PLACEHOLDER_TITLE, SUMMARY_PLACEHOLDER_ABSTRACT);
        events.log("Summarization completed (placeholder)");
        paper
    }

    async fn simulate(&self) -> Result<Paper, PipelineError> {
        let events = &self.ctx.events;
        events.log("Simulation: running data alchemy and experiment designer...");

        let dataset = self.synthesize(&json!(SIMULATION_PROMPT)).await;
        events.log(format!(
            "Simulated dataset created (rows={})",
            dataset.rows.len()
        ));

        let results = self.experiment(&dataset, SIMULATION_PROMPT).await;
        events.log(format!("Simulation results: {}", results.summary_value()));

        let (results, critique) = self.critique(&results).await?;

        let paper = Paper::new(
            "Experiment Simulation Results",
            "Auto-generated simulation abstract.",
        )
        .with_results(results)
        .with_critique(critique)
        .with_meta(self.meta());

        events.log("Simulation pipeline finished");
        Ok(paper)
    }

    async fn full(&self) -> Result<Paper, PipelineError> {
        let events = &self.ctx.events;
        events.log("Running full default pipeline");

        let (_, questions) = self.scout_and_ask().await?;
        let chosen = questions
            .first()
            .cloned()
            .unwrap_or_else(|| "Untitled question".to_string());
        events.log(format!("Chosen question: {}", chosen));

        let dataset = self.synthesize(&Value::String(chosen.clone())).await;
        events.log(format!("Dataset ready: rows={}", dataset.rows.len()));

        let results = self.experiment(&dataset, &chosen).await;
        events.log(format!(
            "Experiment results summary: {}",
            results.summary_value()
        ));

        let (results, critique) = self.critique(&results).await?;

        let paper = Paper::new(format!("Mini paper for {}", chosen), "Auto-generated abstract...")
            .with_results(results)
            .with_critique(critique)
            .with_meta(self.meta());

        events.log("Pipeline finished");
        Ok(paper)
    }

    async fn scout_and_ask(&self) -> Result<(Vec<Value>, Vec<String>), PipelineError> {
        let events = &self.ctx.events;

        let domains = DomainScout::new(self.ctx.clone()).run().await.into_value();
        events.log(format!("Scout found: {}", serde_json::to_string(&domains)?));

        let questions = QuestionGenerator::new(self.ctx.clone())
            .run(&domains)
            .await
            .into_value();
        events.log(format!("Questions: {}", serde_json::to_string(&questions)?));

        Ok((domains, questions))
    }

    async fn synthesize(&self, question: &Value) -> Dataset {
        DataAlchemist::new(self.ctx.clone())
            .with_delay(Duration::from_millis(self.settings.alchemist_delay_ms))
            .run(question)
            .await
            .into_value()
    }

    async fn experiment(&self, dataset: &Dataset, question: &str) -> ExperimentResult {
        ExperimentDesigner::new(self.ctx.clone())
            .run(dataset, question)
            .await
            .into_value()
    }

    /// Serialized results and the critic's verdict on them
    async fn critique(&self, results: &ExperimentResult) -> Result<(Value, Value), PipelineError> {
        let results = serde_json::to_value(results)?;
        let critique = Critic::new(self.ctx.clone())
            .with_context_chars(self.settings.critic_context_chars)
            .run(&results)
            .await
            .into_value();

        let critique = serde_json::to_value(&critique)?;
        self.ctx.events.log(format!("Critic: {}", critique));
        Ok((results, critique))
    }

    fn meta(&self) -> Value {
        json!({
            "run_id": self.run_id,
            "mode": self.mode,
            "generated_at": Utc::now().to_rfc3339(),
        })
    }
}
