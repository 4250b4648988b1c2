//! HTTP API integration tests

mod common;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;

use agentic_research_lib::RunPhase;
use common::{test_app, wait_for_terminal, ScriptedModel, CRITIC_RESPONSE, QUESTIONS_RESPONSE, SCOUT_RESPONSE};

async fn send(app: &axum::Router, method: &str, uri: &str) -> axum::response::Response {
    let req = Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .expect("Failed to build request");
    app.clone().oneshot(req).await.expect("Request failed")
}

async fn body_bytes(response: axum::response::Response) -> Vec<u8> {
    response
        .into_body()
        .collect()
        .await
        .expect("Failed to read body")
        .to_bytes()
        .to_vec()
}

async fn json_response(app: &axum::Router, method: &str, uri: &str) -> (StatusCode, Value) {
    let response = send(app, method, uri).await;
    let status = response.status();
    let body = body_bytes(response).await;
    let value: Value = serde_json::from_slice(&body).expect("Invalid JSON response");
    (status, value)
}

#[tokio::test]
async fn test_health() {
    let (app, _) = test_app(Arc::new(ScriptedModel::default()));
    let response = send(&app, "GET", "/health").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_bytes(response).await, b"OK");
}

#[tokio::test]
async fn test_start_run_defaults_to_default_mode() {
    let (app, orchestrator) = test_app(Arc::new(ScriptedModel::default()));

    let (status, body) = json_response(&app, "POST", "/run").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "started");
    assert_eq!(body["mode"], "default");

    let run_id = body["run_id"].as_str().unwrap().to_string();
    assert!(orchestrator.get_status(&run_id).is_some());
    orchestrator.join_all().await;
}

#[tokio::test]
async fn test_run_status_and_result_lifecycle() {
    let model = Arc::new(ScriptedModel::new([SCOUT_RESPONSE, QUESTIONS_RESPONSE]));
    let (app, orchestrator) = test_app(model);

    let (_, started) = json_response(&app, "POST", "/run?mode=explore").await;
    assert_eq!(started["mode"], "explore");
    let run_id = started["run_id"].as_str().unwrap().to_string();

    assert_eq!(wait_for_terminal(&orchestrator, &run_id).await, RunPhase::Completed);

    let (status, body) = json_response(&app, "GET", &format!("/status/{}", run_id)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["phase"], "completed");
    assert_eq!(body["mode"], "explore");
    assert_eq!(body["logs"][0], "Starting pipeline (mode=explore)");

    let (status, paper) = json_response(&app, "GET", &format!("/result/{}", run_id)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(paper["title"], "Exploration: Does stellar mass predict flare rate?");
    assert_eq!(paper["abstract"], "Auto-generated exploration summary.");
    assert_eq!(paper["results"]["domains"][0]["name"], "Astronomy");
}

#[tokio::test]
async fn test_unknown_run_status_and_result() {
    let (app, _) = test_app(Arc::new(ScriptedModel::default()));

    let (status, body) = json_response(&app, "GET", "/status/nope").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, serde_json::json!({"phase": "unknown", "logs": []}));

    let (status, body) = json_response(&app, "GET", "/result/nope").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, serde_json::json!({}));
}

#[tokio::test]
async fn test_download_unknown_run_is_404() {
    let (app, _) = test_app(Arc::new(ScriptedModel::default()));

    let (status, body) = json_response(&app, "GET", "/result/nope/download?format=pdf").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "run_id not found");
}

#[tokio::test]
async fn test_download_formats() {
    let model = Arc::new(ScriptedModel::new([
        SCOUT_RESPONSE,
        QUESTIONS_RESPONSE,
        CRITIC_RESPONSE,
    ]));
    let (app, orchestrator) = test_app(model);

    let (_, started) = json_response(&app, "POST", "/run").await;
    let run_id = started["run_id"].as_str().unwrap().to_string();
    assert_eq!(wait_for_terminal(&orchestrator, &run_id).await, RunPhase::Completed);

    // Markdown is the default format
    let response = send(&app, "GET", &format!("/result/{}/download", run_id)).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "text/markdown");
    assert_eq!(
        response.headers()[header::CONTENT_DISPOSITION],
        format!("attachment; filename=paper_{}.md", run_id).as_str()
    );
    let markdown = String::from_utf8(body_bytes(response).await).unwrap();
    assert!(markdown.starts_with("# Mini paper for "));
    assert!(markdown.contains("## Critic"));

    let response = send(&app, "GET", &format!("/result/{}/download?format=pdf", run_id)).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "application/pdf");
    assert_eq!(
        response.headers()[header::CONTENT_DISPOSITION],
        format!("attachment; filename=paper_{}.pdf", run_id).as_str()
    );
    assert!(body_bytes(response).await.starts_with(b"%PDF-1.4"));

    let (status, body) =
        json_response(&app, "GET", &format!("/result/{}/download?format=docx", run_id)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "unsupported format");
}

#[tokio::test]
async fn test_cors_preflight_is_permissive_by_default() {
    let (app, _) = test_app(Arc::new(ScriptedModel::default()));

    let req = Request::builder()
        .method("OPTIONS")
        .uri("/run")
        .header(header::ORIGIN, "http://example.test")
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(req).await.unwrap();

    assert_eq!(
        response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
        "*"
    );
}
