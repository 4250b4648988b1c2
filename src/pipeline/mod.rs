//! Research pipeline orchestration
//!
//! - [`RunRegistry`] owns every run record (status, logs, paper)
//! - [`RunEventSink`] is the per-run handle agents write log lines through
//! - [`Orchestrator`] starts supervised pipeline tasks and answers queries

pub mod events;
pub mod orchestrator;
pub mod registry;

pub use events::RunEventSink;
pub use orchestrator::Orchestrator;
pub use registry::{RunRecord, RunRegistry};

use thiserror::Error;

use crate::models::state_machine::PhaseTransitionError;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Run not found: {0}")]
    RunNotFound(String),

    #[error("Invalid phase change: {0}")]
    Transition(#[from] PhaseTransitionError),

    #[error("Failed to serialize stage output: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Pipeline task panicked: {0}")]
    Panicked(String),

    #[error("Pipeline task was cancelled")]
    Cancelled,
}
