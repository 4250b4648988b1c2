//! Run lifecycle routes
//!
//! Handles: POST /run, GET /status/:run_id, GET /result/:run_id

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::models::RunMode;
use crate::server::ServerAppState;

#[derive(Debug, Deserialize)]
pub struct RunQuery {
    pub mode: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct RunStarted {
    pub run_id: String,
    pub status: String,
    pub mode: String,
}

/// Start a run in the background and return its id immediately
pub async fn start_run(
    State(state): State<ServerAppState>,
    Query(query): Query<RunQuery>,
) -> Json<RunStarted> {
    let mode = query
        .mode
        .unwrap_or_else(|| RunMode::Default.as_str().to_string());
    let run_id = state.orchestrator.start(&mode);

    Json(RunStarted {
        run_id,
        status: "started".to_string(),
        mode,
    })
}

/// Status record of a run, or `{phase: "unknown", logs: []}`
pub async fn get_status(
    State(state): State<ServerAppState>,
    Path(run_id): Path<String>,
) -> Json<Value> {
    let status = state
        .orchestrator
        .get_status(&run_id)
        .and_then(|status| serde_json::to_value(status).ok());

    Json(status.unwrap_or_else(|| json!({"phase": "unknown", "logs": []})))
}

/// Paper of a completed run, or `{}`
pub async fn get_result(
    State(state): State<ServerAppState>,
    Path(run_id): Path<String>,
) -> Json<Value> {
    let paper = state
        .orchestrator
        .get_result(&run_id)
        .and_then(|paper| serde_json::to_value(paper).ok());

    Json(paper.unwrap_or_else(|| json!({})))
}
