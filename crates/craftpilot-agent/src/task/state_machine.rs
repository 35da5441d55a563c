//! Task lifecycle state machine with validated transitions.
//!
//! Enforces the allowed transitions:
//! Idle -> Processing -> Complete/Error/Stopped
//! Each terminal state transitions back to Idle, so a new submission can
//! start a fresh task.

use craftpilot_core::TaskState;

use crate::error::AgentError;

/// Validate that a lifecycle transition is allowed.
///
/// Valid transitions:
/// - Idle -> Processing
/// - Processing -> Complete
/// - Processing -> Error
/// - Processing -> Stopped
/// - Complete -> Idle
/// - Error -> Idle
/// - Stopped -> Idle
pub fn validate_transition(from: TaskState, to: TaskState) -> Result<(), AgentError> {
    let valid = matches!(
        (from, to),
        (TaskState::Idle, TaskState::Processing)
            | (TaskState::Processing, TaskState::Complete)
            | (TaskState::Processing, TaskState::Error)
            | (TaskState::Processing, TaskState::Stopped)
            | (TaskState::Complete, TaskState::Idle)
            | (TaskState::Error, TaskState::Idle)
            | (TaskState::Stopped, TaskState::Idle)
    );

    if valid {
        Ok(())
    } else {
        Err(AgentError::InvalidTransition(from, to))
    }
}
