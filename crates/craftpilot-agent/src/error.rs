use craftpilot_core::TaskState;
use thiserror::Error;

/// Errors produced by the orchestration core.
#[derive(Debug, Error)]
pub enum AgentError {
    #[error("No endpoint registered under '{0}'")]
    EndpointNotFound(String),

    #[error("No active endpoint selected")]
    NoActiveEndpoint,

    #[error("No active connection available for dispatch")]
    NoActiveConnection,

    #[error("No structured payload found in model response")]
    NoStructuredPayload,

    #[error("Malformed structured payload: {0}")]
    MalformedPayload(String),

    #[error("Action {action_id} timed out after {timeout_ms}ms")]
    ActionTimeout { action_id: u64, timeout_ms: u64 },

    #[error("Action {action_id} failed: {reason}")]
    ActionFailed { action_id: u64, reason: String },

    #[error("No task running")]
    NoTaskRunning,

    #[error("A task is already running")]
    TaskAlreadyRunning,

    #[error("Invalid task state transition: {0} -> {1}")]
    InvalidTransition(TaskState, TaskState),

    #[error("Completion request failed: {0}")]
    Completion(String),

    #[error("Acknowledgement channel closed")]
    ChannelClosed,
}

impl From<reqwest::Error> for AgentError {
    fn from(err: reqwest::Error) -> Self {
        AgentError::Completion(err.to_string())
    }
}

impl From<AgentError> for craftpilot_core::CraftError {
    fn from(err: AgentError) -> Self {
        craftpilot_core::CraftError::Agent(err.to_string())
    }
}
