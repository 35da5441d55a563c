//! The single current task and its guarded store.
//!
//! Exactly one task exists at a time. Only the orchestrator transitions its
//! lifecycle; the dispatcher reads it at the cooperative stop checkpoint.

pub mod state_machine;

use std::sync::{Mutex, MutexGuard};

use serde::{Deserialize, Serialize};

use craftpilot_core::{TaskSettings, TaskState, Timestamp};

use crate::error::AgentError;
use state_machine::validate_transition;

/// Read-only copy of the current task for status queries.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskSnapshot {
    pub prompt: String,
    pub settings: TaskSettings,
    pub state: TaskState,
    pub started_at: Timestamp,
    /// Actions produced by interpretation, once known.
    pub total_actions: usize,
    /// Actions acknowledged as complete so far.
    pub completed_actions: usize,
    /// Failure reason retained when the task ends in `error`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<String>,
}

struct CurrentTask {
    prompt: String,
    settings: TaskSettings,
    state: TaskState,
    started_at: Timestamp,
    total_actions: usize,
    completed_actions: usize,
    failure: Option<String>,
}

/// Mutex-guarded slot holding the single current task.
#[derive(Default)]
pub struct TaskStore {
    current: Mutex<Option<CurrentTask>>,
}

impl TaskStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Option<CurrentTask>> {
        match self.current.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Replace the slot with a fresh task in `processing`.
    ///
    /// Fails with `TaskAlreadyRunning` if the current task is still
    /// `processing`; terminal states and the empty slot accept a new task.
    pub fn begin(&self, prompt: &str, settings: TaskSettings) -> Result<(), AgentError> {
        let mut slot = self.lock();
        if let Some(task) = slot.as_ref() {
            if !task.state.accepts_submission() {
                return Err(AgentError::TaskAlreadyRunning);
            }
        }
        validate_transition(TaskState::Idle, TaskState::Processing)?;
        *slot = Some(CurrentTask {
            prompt: prompt.to_string(),
            settings,
            state: TaskState::Processing,
            started_at: Timestamp::now(),
            total_actions: 0,
            completed_actions: 0,
            failure: None,
        });
        Ok(())
    }

    /// Lifecycle state of the current task, `Idle` when none exists.
    pub fn state(&self) -> TaskState {
        self.lock()
            .as_ref()
            .map(|task| task.state)
            .unwrap_or(TaskState::Idle)
    }

    /// Whether the current task was externally stopped.
    pub fn is_stopped(&self) -> bool {
        self.state() == TaskState::Stopped
    }

    /// Record how many actions interpretation produced.
    pub fn set_total_actions(&self, total: usize) {
        if let Some(task) = self.lock().as_mut() {
            task.total_actions = total;
        }
    }

    /// Count one acknowledged action.
    pub fn record_completed_action(&self) {
        if let Some(task) = self.lock().as_mut() {
            task.completed_actions += 1;
        }
    }

    /// Apply a validated lifecycle transition to the current task.
    pub fn transition(&self, to: TaskState) -> Result<(), AgentError> {
        let mut slot = self.lock();
        let task = slot.as_mut().ok_or(AgentError::NoTaskRunning)?;
        validate_transition(task.state, to)?;
        task.state = to;
        Ok(())
    }

    /// End the current task in `error`, retaining the reason.
    ///
    /// A task that was stopped while a dispatch error was in flight stays
    /// `stopped`; the stop takes precedence.
    pub fn record_failure(&self, reason: &str) {
        let mut slot = self.lock();
        if let Some(task) = slot.as_mut() {
            if task.state == TaskState::Processing {
                task.state = TaskState::Error;
                task.failure = Some(reason.to_string());
            } else {
                tracing::debug!(state = %task.state, reason, "Failure after terminal state, ignored");
            }
        }
    }

    /// Copy of the current task, if any.
    pub fn snapshot(&self) -> Option<TaskSnapshot> {
        self.lock().as_ref().map(|task| TaskSnapshot {
            prompt: task.prompt.clone(),
            settings: task.settings.clone(),
            state: task.state,
            started_at: task.started_at,
            total_actions: task.total_actions,
            completed_actions: task.completed_actions,
            failure: task.failure.clone(),
        })
    }
}
