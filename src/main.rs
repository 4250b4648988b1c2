use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;

use agentic_research_lib::config::{self, API_KEY_ENV};
use agentic_research_lib::events::EventBroadcaster;
use agentic_research_lib::llm::OpenRouterClient;
use agentic_research_lib::pipeline::Orchestrator;
use agentic_research_lib::server::{self, ServerAppState};
use agentic_research_lib::shutdown::{register_signal_handlers, ShutdownHandler, ShutdownState};

/// Agentic Research - LLM agent pipeline that writes synthetic mini-papers
#[derive(Parser, Debug)]
#[command(name = "agentic-research")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Configuration file (merged over ~/.agentic-research/config.toml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Port to bind the server to
    #[arg(long, env = "RESEARCH_PORT")]
    port: Option<u16>,

    /// Address to bind the server to
    #[arg(long, env = "RESEARCH_BIND")]
    bind: Option<String>,
}

fn main() {
    let cli = Cli::parse();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(e) = run(cli) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let mut app_config =
        config::load_config(cli.config.as_deref()).context("Failed to load configuration")?;
    if let Some(port) = cli.port {
        app_config.server.port = port;
    }
    if let Some(bind) = cli.bind {
        app_config.server.bind = bind;
    }

    if app_config.llm.api_key.is_none() {
        log::warn!(
            "{} is not set; every LLM-backed agent will use its fallback output",
            API_KEY_ENV
        );
    }
    log::info!(
        "Using model {} at {}",
        app_config.llm.model,
        app_config.llm.base_url
    );

    let rt = tokio::runtime::Runtime::new().context("Failed to create tokio runtime")?;

    rt.block_on(async {
        let shutdown_state = ShutdownState::new();
        if let Err(e) = register_signal_handlers(shutdown_state.clone()) {
            log::warn!("Failed to register signal handlers: {}", e);
        }

        let llm = OpenRouterClient::new(app_config.llm.clone())
            .context("Failed to build LLM client")?;
        let broadcaster = Arc::new(EventBroadcaster::new());
        let orchestrator = Arc::new(
            Orchestrator::new(Arc::new(llm), app_config.pipeline.clone())
                .with_broadcaster(broadcaster.clone()),
        );

        let state = ServerAppState::new(orchestrator.clone(), broadcaster);
        let served = server::run_server(&app_config.server, state, shutdown_state.clone()).await;

        ShutdownHandler::with_state(shutdown_state)
            .drain(&orchestrator)
            .await;

        served.map_err(anyhow::Error::msg)
    })
}
