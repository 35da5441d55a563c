//! Craftpilot application binary - composition root.
//!
//! Ties together all Craftpilot crates into a single executable:
//! 1. Load configuration from TOML
//! 2. Build the orchestration core (registry, task store, dispatcher,
//!    LM Studio client, orchestrator)
//! 3. Start the WebSocket gateway the game-client mod connects to
//! 4. Start the axum REST API server

mod cli;

use std::sync::Arc;

use clap::Parser;
use tokio::sync::broadcast;

use craftpilot_agent::dispatcher::ActionDispatcher;
use craftpilot_agent::llm::LmStudioClient;
use craftpilot_agent::orchestrator::Orchestrator;
use craftpilot_agent::registry::ConnectionRegistry;
use craftpilot_agent::task::TaskStore;
use craftpilot_api::{routes, state::AppState};
use craftpilot_core::config::CraftConfig;
use craftpilot_gateway::{start_gateway, MessageRouter};

use cli::CliArgs;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();

    // Config.
    let config_file = args.resolve_config_path();
    let config = CraftConfig::load_or_default(&config_file);

    // Tracing. CLI flag wins over the config file level; RUST_LOG wins
    // over both.
    let log_level = args
        .resolve_log_level()
        .unwrap_or_else(|| config.general.log_level.clone());
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .init();

    tracing::info!("Starting Craftpilot v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!(path = %config_file.display(), "Configuration loaded");

    let ws_port = args.resolve_ws_port(config.server.ws_port);
    let api_port = args.resolve_api_port(config.server.api_port);

    // Orchestration core.
    let registry = Arc::new(ConnectionRegistry::new());
    let store = Arc::new(TaskStore::new());
    let (event_tx, _) = broadcast::channel(256);
    let dispatcher = Arc::new(ActionDispatcher::new(
        registry.clone(),
        store.clone(),
        config.dispatch.action_timeout_ms,
        event_tx.clone(),
    ));
    let client = Arc::new(LmStudioClient::new(&config.llm)?);
    let orchestrator = Arc::new(Orchestrator::new(
        registry.clone(),
        store,
        dispatcher.clone(),
        client,
        event_tx.clone(),
    ));

    // WebSocket gateway for the game-client mod.
    let router = Arc::new(MessageRouter::new(
        registry.clone(),
        dispatcher,
        event_tx.clone(),
    ));
    tokio::spawn(async move {
        if let Err(e) = start_gateway(ws_port, router).await {
            tracing::error!(error = %e, "Gateway stopped");
        }
    });

    // REST API server (blocks until shutdown).
    let app_state = AppState::new(config, orchestrator, registry, event_tx);
    routes::start_server(api_port, app_state).await?;

    Ok(())
}
