//! HTTP route handlers
//!
//! - run_routes: starting runs and reading their status / paper
//! - report_routes: Markdown and PDF downloads of a finished paper

pub mod report_routes;
pub mod run_routes;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::Value;

pub use report_routes::download_result;
pub use run_routes::{get_result, get_status, start_run};

/// JSON body with an explicit status code
pub fn json_error(status: StatusCode, body: Value) -> Response {
    (status, Json(body)).into_response()
}
