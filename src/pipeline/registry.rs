// Run registry: the single owner of run records
//
// A run's paper is recorded under the same lock that moves it to
// `completed`, so a paper exists exactly when the phase is `completed`.

use chrono::Utc;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use uuid::Uuid;

use super::PipelineError;
use crate::models::state_machine::{is_terminal_phase, transition_phase};
use crate::models::{Paper, RunPhase, RunStatus};
use crate::utils::lock_mutex_recover;

#[derive(Debug, Clone)]
pub struct RunRecord {
    pub status: RunStatus,
    pub paper: Option<Paper>,
}

#[derive(Debug, Default)]
struct RegistryInner {
    runs: HashMap<String, RunRecord>,
    /// Run ids in creation order
    order: VecDeque<String>,
}

#[derive(Debug, Default)]
pub struct RunRegistry {
    inner: Mutex<RegistryInner>,
    max_retained: Option<usize>,
}

impl RunRegistry {
    /// Registry that keeps every run for the process lifetime
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry that evicts the oldest finished runs beyond `max_retained`.
    /// Runs still in flight are never evicted.
    pub fn with_max_retained(max_retained: Option<usize>) -> Self {
        Self {
            inner: Mutex::default(),
            max_retained,
        }
    }

    /// Allocate a fresh run in the `initialized` phase
    pub fn create(&self, mode: &str) -> String {
        let run_id = Uuid::new_v4().to_string();
        let mut inner = lock_mutex_recover(&self.inner);
        inner.runs.insert(
            run_id.clone(),
            RunRecord {
                status: RunStatus::new(mode),
                paper: None,
            },
        );
        inner.order.push_back(run_id.clone());
        self.evict(&mut inner);
        run_id
    }

    /// Append a log line, returning its index. Unknown runs are ignored.
    pub fn append_log(&self, run_id: &str, message: impl Into<String>) -> Option<usize> {
        let mut inner = lock_mutex_recover(&self.inner);
        let record = inner.runs.get_mut(run_id)?;
        record.status.logs.push(message.into());
        Some(record.status.logs.len() - 1)
    }

    /// Record the paper and move to `completed`
    pub fn complete(&self, run_id: &str, paper: Paper) -> Result<(), PipelineError> {
        let mut inner = lock_mutex_recover(&self.inner);
        let record = inner
            .runs
            .get_mut(run_id)
            .ok_or_else(|| PipelineError::RunNotFound(run_id.to_string()))?;

        record.status.phase = transition_phase(record.status.phase, RunPhase::Completed)?;
        record.status.finished_at = Some(Utc::now());
        record.paper = Some(paper);
        self.evict(&mut inner);
        Ok(())
    }

    /// Append `message` and move to `error`, returning the line's index.
    /// No paper is recorded.
    pub fn fail(&self, run_id: &str, message: impl Into<String>) -> Result<usize, PipelineError> {
        let mut inner = lock_mutex_recover(&self.inner);
        let record = inner
            .runs
            .get_mut(run_id)
            .ok_or_else(|| PipelineError::RunNotFound(run_id.to_string()))?;

        record.status.phase = transition_phase(record.status.phase, RunPhase::Error)?;
        record.status.logs.push(message.into());
        record.status.finished_at = Some(Utc::now());
        let index = record.status.logs.len() - 1;
        self.evict(&mut inner);
        Ok(index)
    }

    pub fn status(&self, run_id: &str) -> Option<RunStatus> {
        lock_mutex_recover(&self.inner)
            .runs
            .get(run_id)
            .map(|r| r.status.clone())
    }

    pub fn paper(&self, run_id: &str) -> Option<Paper> {
        lock_mutex_recover(&self.inner)
            .runs
            .get(run_id)
            .and_then(|r| r.paper.clone())
    }

    pub fn contains(&self, run_id: &str) -> bool {
        lock_mutex_recover(&self.inner).runs.contains_key(run_id)
    }

    pub fn len(&self) -> usize {
        lock_mutex_recover(&self.inner).runs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn evict(&self, inner: &mut RegistryInner) {
        let Some(max) = self.max_retained else {
            return;
        };

        while inner.runs.len() > max {
            let oldest_finished = inner.order.iter().position(|id| {
                inner
                    .runs
                    .get(id)
                    .map(|r| is_terminal_phase(r.status.phase))
                    .unwrap_or(true)
            });

            let Some(pos) = oldest_finished else {
                break;
            };
            if let Some(id) = inner.order.remove(pos) {
                inner.runs.remove(&id);
                log::debug!("Evicted finished run {}", id);
            }
        }
    }
}
