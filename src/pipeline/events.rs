// Per-run event sink handed to agents

use std::sync::Arc;

use super::RunRegistry;
use crate::events::{EventBroadcaster, RunLogPayload, RunPhasePayload, EVENT_RUN_LOG, EVENT_RUN_PHASE};
use crate::models::RunPhase;

#[derive(Clone)]
struct SinkTarget {
    run_id: String,
    registry: Arc<RunRegistry>,
    broadcaster: Option<Arc<EventBroadcaster>>,
}

/// Cloneable handle that appends ordered log lines to one run.
///
/// The no-op sink discards everything, which is what standalone agent
/// calls use.
#[derive(Clone, Default)]
pub struct RunEventSink {
    target: Option<SinkTarget>,
}

impl RunEventSink {
    pub fn new(
        run_id: impl Into<String>,
        registry: Arc<RunRegistry>,
        broadcaster: Option<Arc<EventBroadcaster>>,
    ) -> Self {
        Self {
            target: Some(SinkTarget {
                run_id: run_id.into(),
                registry,
                broadcaster,
            }),
        }
    }

    pub fn noop() -> Self {
        Self::default()
    }

    pub fn run_id(&self) -> Option<&str> {
        self.target.as_ref().map(|t| t.run_id.as_str())
    }

    /// Append a line to the run's log and publish it
    pub fn log(&self, message: impl Into<String>) {
        let Some(target) = &self.target else {
            return;
        };

        let message = message.into();
        log::debug!("[run {}] {}", target.run_id, message);

        match target.registry.append_log(&target.run_id, message.clone()) {
            Some(index) => self.publish_log(index, message),
            None => log::warn!("Dropping log line for unknown run {}", target.run_id),
        }
    }

    /// Broadcast a line that is already in the run's log
    pub(crate) fn publish_log(&self, index: usize, message: String) {
        let Some(SinkTarget {
            run_id,
            broadcaster: Some(broadcaster),
            ..
        }) = &self.target
        else {
            return;
        };

        broadcaster.broadcast(
            EVENT_RUN_LOG,
            RunLogPayload {
                run_id: run_id.clone(),
                index,
                message,
            },
        );
    }

    /// Publish a phase change. The registry is updated by the orchestrator.
    pub fn phase(&self, phase: RunPhase, mode: &str) {
        let Some(target) = &self.target else {
            return;
        };

        log::info!("Run {} is now {}", target.run_id, phase.as_str());
        if let Some(broadcaster) = &target.broadcaster {
            broadcaster.broadcast(
                EVENT_RUN_PHASE,
                RunPhasePayload {
                    run_id: target.run_id.clone(),
                    phase: phase.as_str().to_string(),
                    mode: mode.to_string(),
                },
            );
        }
    }
}
