//! Application state shared across all route handlers.
//!
//! AppState holds references to the orchestration core and shared
//! resources. It is passed to handlers via axum's State extractor.

use std::sync::{Arc, Mutex};
use std::time::Instant;

use craftpilot_agent::orchestrator::Orchestrator;
use craftpilot_agent::registry::ConnectionRegistry;
use craftpilot_core::config::CraftConfig;
use craftpilot_core::events::DomainEvent;

/// Shared application state.
///
/// All fields use `Arc` for cheap cloning across handler tasks.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration.
    pub config: Arc<Mutex<CraftConfig>>,
    /// The task orchestration core.
    pub orchestrator: Arc<Orchestrator>,
    /// Registry of connected game-client instances.
    pub registry: Arc<ConnectionRegistry>,
    /// Broadcast sender for SSE events.
    pub event_tx: tokio::sync::broadcast::Sender<DomainEvent>,
    /// Server start time for uptime calculation.
    pub start_time: Instant,
}

impl AppState {
    /// Create a new AppState around the orchestration core.
    pub fn new(
        config: CraftConfig,
        orchestrator: Arc<Orchestrator>,
        registry: Arc<ConnectionRegistry>,
        event_tx: tokio::sync::broadcast::Sender<DomainEvent>,
    ) -> Self {
        Self {
            config: Arc::new(Mutex::new(config)),
            orchestrator,
            registry,
            event_tx,
            start_time: Instant::now(),
        }
    }
}
