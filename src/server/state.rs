//! Server application state shared across handlers

use std::sync::Arc;

use crate::events::EventBroadcaster;
use crate::pipeline::Orchestrator;

/// Shared state for the server: the run orchestrator and the broadcaster
/// WebSocket clients subscribe to.
#[derive(Clone)]
pub struct ServerAppState {
    pub orchestrator: Arc<Orchestrator>,
    pub broadcaster: Arc<EventBroadcaster>,
}

impl ServerAppState {
    pub fn new(orchestrator: Arc<Orchestrator>, broadcaster: Arc<EventBroadcaster>) -> Self {
        Self {
            orchestrator,
            broadcaster,
        }
    }
}
