//! HTTP/WebSocket surface of the research pipeline
//!
//! Starting runs, polling their status, fetching and downloading papers,
//! plus a WebSocket stream of run events.

mod events;
pub mod routes;
pub mod state;

pub use state::ServerAppState;

use axum::{
    http::{
        header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
        HeaderValue,
    },
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};

use crate::config::ServerConfig;
use crate::shutdown::ShutdownState;

/// CORS layer: restricted to `origins` when given, permissive otherwise
fn cors_layer(origins: Option<&[String]>) -> CorsLayer {
    match origins {
        Some(origins) if !origins.is_empty() => {
            let allowed_origins: Vec<HeaderValue> =
                origins.iter().filter_map(|o| o.parse().ok()).collect();
            CorsLayer::new()
                .allow_origin(allowed_origins)
                .allow_methods(Any)
                .allow_headers([AUTHORIZATION, CONTENT_TYPE, ACCEPT])
        }
        _ => CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any),
    }
}

/// Build the application router
pub fn build_router(state: ServerAppState, cors_origins: Option<&[String]>) -> Router {
    Router::new()
        .route("/run", post(routes::start_run))
        .route("/status/:run_id", get(routes::get_status))
        .route("/result/:run_id", get(routes::get_result))
        .route("/result/:run_id/download", get(routes::download_result))
        .route("/ws/events", get(events::ws_handler))
        .route("/health", get(health_handler))
        .layer(cors_layer(cors_origins))
        .with_state(state)
}

/// Run the HTTP/WebSocket server until `shutdown` is requested
pub async fn run_server(
    config: &ServerConfig,
    state: ServerAppState,
    shutdown: ShutdownState,
) -> Result<(), String> {
    let app = build_router(state, config.cors_origins.as_deref());

    let addr: SocketAddr = format!("{}:{}", config.bind, config.port)
        .parse()
        .map_err(|e| format!("Invalid address: {}", e))?;

    let cors_display = match &config.cors_origins {
        Some(origins) if !origins.is_empty() => origins.join(", "),
        _ => "*".to_string(),
    };

    println!("\nAgentic Research server");
    println!("  Server URL:   http://{}", addr);
    println!("  CORS Origins: {}", cors_display);
    println!("  Endpoints:");
    println!("    POST /run?mode=...                    - Start a run");
    println!("    GET  /status/:run_id                  - Run phase and logs");
    println!("    GET  /result/:run_id                  - Finished paper");
    println!("    GET  /result/:run_id/download?format= - Paper as md or pdf");
    println!("    GET  /ws/events                       - WebSocket run events");
    println!("    GET  /health                          - Health check\n");

    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| format!("Failed to bind to {}: {}", addr, e))?;

    log::info!("Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async move { shutdown.wait_for_shutdown().await })
        .await
        .map_err(|e| format!("Server error: {}", e))
}

/// Health check endpoint
async fn health_handler() -> &'static str {
    "OK"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_health_handler() {
        assert_eq!(health_handler().await, "OK");
    }

    #[test]
    fn test_cors_layer_accepts_both_shapes() {
        let origins = vec!["http://localhost:5173".to_string()];
        let _restricted = cors_layer(Some(&origins));
        let _permissive = cors_layer(None);
        let _empty = cors_layer(Some(&[]));
    }
}
