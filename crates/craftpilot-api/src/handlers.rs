//! HTTP request handlers.
//!
//! Thin adapters over the orchestration core: each handler extracts its
//! inputs, calls into the orchestrator or registry, and shapes the JSON
//! response. Prompt submission always answers 200 with a success flag,
//! carrying the failure reason in-band.

use axum::extract::{Path, State};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::{Stream, StreamExt};
use tracing::info;

use craftpilot_agent::orchestrator::StatusReport;
use craftpilot_core::events::DomainEvent;
use craftpilot_core::{TaskSettings, Timestamp};
use craftpilot_detect::{detect_instances, InstanceDescriptor};

use crate::error::ApiError;
use crate::state::AppState;

/// Request body for `POST /api/prompt`.
#[derive(Debug, Deserialize)]
pub struct PromptRequest {
    pub prompt: String,
    #[serde(default)]
    pub settings: TaskSettings,
}

/// Response body for `POST /api/prompt`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptResponse {
    pub success: bool,
    pub state: craftpilot_core::TaskState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actions_executed: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// GET /health - liveness check with uptime.
pub async fn health(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "uptime_secs": state.start_time.elapsed().as_secs(),
    }))
}

/// GET /api/status - lifecycle state, task snapshot, endpoint inventory.
pub async fn status(State(state): State<AppState>) -> Json<StatusReport> {
    Json(state.orchestrator.status())
}

/// POST /api/prompt - submit a prompt and drive it to a terminal state.
///
/// The response is always 200; failures are reported in-band so the caller
/// sees the terminal state alongside the reason.
pub async fn prompt(
    State(state): State<AppState>,
    Json(request): Json<PromptRequest>,
) -> Result<Json<PromptResponse>, ApiError> {
    if request.prompt.trim().is_empty() {
        return Err(ApiError::BadRequest("Prompt must not be empty".to_string()));
    }

    info!(prompt = %request.prompt, "Prompt received");
    match state
        .orchestrator
        .submit(&request.prompt, request.settings)
        .await
    {
        Ok(report) => Ok(Json(PromptResponse {
            success: true,
            state: report.state,
            actions_executed: Some(report.actions_executed),
            error: None,
        })),
        Err(e) => Ok(Json(PromptResponse {
            success: false,
            state: state.orchestrator.status().state,
            actions_executed: None,
            error: Some(e.to_string()),
        })),
    }
}

/// POST /api/stop - stop the current task.
pub async fn stop(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    state.orchestrator.request_stop()?;
    Ok(Json(json!({ "success": true })))
}

/// GET /api/instances - scan for running game-client instances.
pub async fn instances(State(_state): State<AppState>) -> Json<Vec<InstanceDescriptor>> {
    Json(detect_instances().await)
}

/// POST /api/instances/{id}/connect - designate the active instance.
pub async fn connect(
    State(state): State<AppState>,
    Path(instance_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    state.registry.activate(&instance_id)?;
    info!(instance_id = %instance_id, "Instance activated");
    let _ = state.event_tx.send(DomainEvent::EndpointActivated {
        instance_id: instance_id.clone(),
        timestamp: Timestamp::now(),
    });
    Ok(Json(json!({
        "success": true,
        "activeInstance": instance_id,
    })))
}

/// GET /api/stream - SSE feed of domain events.
pub async fn stream(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, std::convert::Infallible>>> {
    let rx = state.event_tx.subscribe();
    let stream = BroadcastStream::new(rx).filter_map(|result| {
        // Lagged receivers drop the missed events and continue.
        let event = result.ok()?;
        let data = serde_json::to_string(&event).ok()?;
        Some(Ok(Event::default().event(event.event_name()).data(data)))
    });

    Sse::new(stream).keep_alive(KeepAlive::default())
}
