use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// =============================================================================
// Timestamp
// =============================================================================

/// Millisecond-precision UTC timestamp.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Timestamp(pub i64);

impl Timestamp {
    /// The current time.
    pub fn now() -> Self {
        Timestamp(Utc::now().timestamp_millis())
    }

    /// Milliseconds elapsed since this timestamp. Never negative.
    pub fn elapsed_ms(&self) -> i64 {
        (Utc::now().timestamp_millis() - self.0).max(0)
    }

    /// Convert to a chrono `DateTime<Utc>`, if representable.
    pub fn to_datetime(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.0)
    }
}

// =============================================================================
// Enums
// =============================================================================

/// Which output shape the model is instructed to produce.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PlannerMode {
    /// Flat list of high-level commands.
    HighLevel,
    /// Flat list of step-by-step actions.
    LowLevel,
    /// Goals with nested actions, flattened before dispatch (default).
    #[default]
    Hybrid,
}

impl fmt::Display for PlannerMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PlannerMode::HighLevel => "high-level",
            PlannerMode::LowLevel => "low-level",
            PlannerMode::Hybrid => "hybrid",
        };
        write!(f, "{}", s)
    }
}

impl FromStr for PlannerMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "high-level" => Ok(PlannerMode::HighLevel),
            "low-level" => Ok(PlannerMode::LowLevel),
            "hybrid" => Ok(PlannerMode::Hybrid),
            other => Err(format!("unknown planner mode: {}", other)),
        }
    }
}

/// Lifecycle state of the single current task.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskState {
    /// No task has been submitted yet (initial).
    #[default]
    Idle,
    /// A task is being planned or dispatched.
    Processing,
    /// All actions completed (terminal).
    Complete,
    /// Planning or dispatch failed (terminal).
    Error,
    /// Stopped by the caller (terminal).
    Stopped,
}

impl TaskState {
    /// Whether a new submission may start from this state.
    pub fn accepts_submission(&self) -> bool {
        !matches!(self, TaskState::Processing)
    }

    /// Whether this state ends a task's lifecycle.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TaskState::Complete | TaskState::Error | TaskState::Stopped
        )
    }
}

impl fmt::Display for TaskState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TaskState::Idle => "idle",
            TaskState::Processing => "processing",
            TaskState::Complete => "complete",
            TaskState::Error => "error",
            TaskState::Stopped => "stopped",
        };
        write!(f, "{}", s)
    }
}

impl FromStr for TaskState {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "idle" => Ok(TaskState::Idle),
            "processing" => Ok(TaskState::Processing),
            "complete" => Ok(TaskState::Complete),
            "error" => Ok(TaskState::Error),
            "stopped" => Ok(TaskState::Stopped),
            other => Err(format!("unknown task state: {}", other)),
        }
    }
}

// =============================================================================
// Task settings
// =============================================================================

/// Per-submission model parameters, as provided by the caller.
///
/// Field names use the wire casing the UI sends (`maxTokens`).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TaskSettings {
    /// Output shape the model is instructed to produce.
    pub mode: PlannerMode,
    /// Sampling temperature.
    pub temperature: f64,
    /// Completion token budget.
    pub max_tokens: u32,
    /// Model identifier passed through to the completion endpoint.
    pub model: String,
}

impl Default for TaskSettings {
    fn default() -> Self {
        Self {
            mode: PlannerMode::Hybrid,
            temperature: 0.7,
            max_tokens: 2000,
            model: "hermes-3-llama-3.1-8b".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // =====================================================================
    // Timestamp
    // =====================================================================

    #[test]
    fn test_timestamp_now_is_positive() {
        assert!(Timestamp::now().0 > 0);
    }

    #[test]
    fn test_timestamp_elapsed_never_negative() {
        let future = Timestamp(Utc::now().timestamp_millis() + 60_000);
        assert_eq!(future.elapsed_ms(), 0);
    }

    #[test]
    fn test_timestamp_to_datetime() {
        let ts = Timestamp(1_700_000_000_000);
        let dt = ts.to_datetime().unwrap();
        assert_eq!(dt.timestamp_millis(), 1_700_000_000_000);
    }

    #[test]
    fn test_timestamp_ordering() {
        assert!(Timestamp(1) < Timestamp(2));
    }

    // =====================================================================
    // PlannerMode
    // =====================================================================

    #[test]
    fn test_planner_mode_display() {
        assert_eq!(PlannerMode::HighLevel.to_string(), "high-level");
        assert_eq!(PlannerMode::LowLevel.to_string(), "low-level");
        assert_eq!(PlannerMode::Hybrid.to_string(), "hybrid");
    }

    #[test]
    fn test_planner_mode_from_str() {
        assert_eq!(
            "high-level".parse::<PlannerMode>().unwrap(),
            PlannerMode::HighLevel
        );
        assert_eq!(
            "low-level".parse::<PlannerMode>().unwrap(),
            PlannerMode::LowLevel
        );
        assert_eq!("hybrid".parse::<PlannerMode>().unwrap(), PlannerMode::Hybrid);
        assert!("medium-level".parse::<PlannerMode>().is_err());
    }

    #[test]
    fn test_planner_mode_default_is_hybrid() {
        assert_eq!(PlannerMode::default(), PlannerMode::Hybrid);
    }

    #[test]
    fn test_planner_mode_serde_kebab_case() {
        let json = serde_json::to_string(&PlannerMode::HighLevel).unwrap();
        assert_eq!(json, "\"high-level\"");
        let back: PlannerMode = serde_json::from_str("\"hybrid\"").unwrap();
        assert_eq!(back, PlannerMode::Hybrid);
    }

    // =====================================================================
    // TaskState
    // =====================================================================

    #[test]
    fn test_task_state_display_round_trip() {
        let states = [
            TaskState::Idle,
            TaskState::Processing,
            TaskState::Complete,
            TaskState::Error,
            TaskState::Stopped,
        ];
        for state in states {
            let parsed: TaskState = state.to_string().parse().unwrap();
            assert_eq!(parsed, state);
        }
    }

    #[test]
    fn test_task_state_from_str_rejects_unknown() {
        assert!("paused".parse::<TaskState>().is_err());
    }

    #[test]
    fn test_task_state_default_is_idle() {
        assert_eq!(TaskState::default(), TaskState::Idle);
    }

    #[test]
    fn test_task_state_terminal_flags() {
        assert!(!TaskState::Idle.is_terminal());
        assert!(!TaskState::Processing.is_terminal());
        assert!(TaskState::Complete.is_terminal());
        assert!(TaskState::Error.is_terminal());
        assert!(TaskState::Stopped.is_terminal());
    }

    #[test]
    fn test_task_state_submission_acceptance() {
        assert!(TaskState::Idle.accepts_submission());
        assert!(TaskState::Complete.accepts_submission());
        assert!(TaskState::Error.accepts_submission());
        assert!(TaskState::Stopped.accepts_submission());
        assert!(!TaskState::Processing.accepts_submission());
    }

    #[test]
    fn test_task_state_serde_snake_case() {
        let json = serde_json::to_string(&TaskState::Processing).unwrap();
        assert_eq!(json, "\"processing\"");
    }

    // =====================================================================
    // TaskSettings
    // =====================================================================

    #[test]
    fn test_task_settings_defaults() {
        let settings = TaskSettings::default();
        assert_eq!(settings.mode, PlannerMode::Hybrid);
        assert!((settings.temperature - 0.7).abs() < f64::EPSILON);
        assert_eq!(settings.max_tokens, 2000);
        assert_eq!(settings.model, "hermes-3-llama-3.1-8b");
    }

    #[test]
    fn test_task_settings_wire_casing() {
        let settings = TaskSettings {
            mode: PlannerMode::LowLevel,
            temperature: 0.2,
            max_tokens: 512,
            model: "local-test".to_string(),
        };
        let json = serde_json::to_string(&settings).unwrap();
        assert!(json.contains("\"maxTokens\":512"));
        assert!(json.contains("\"mode\":\"low-level\""));
    }

    #[test]
    fn test_task_settings_partial_deserialization_fills_defaults() {
        let settings: TaskSettings =
            serde_json::from_str(r#"{"mode": "high-level"}"#).unwrap();
        assert_eq!(settings.mode, PlannerMode::HighLevel);
        assert_eq!(settings.max_tokens, 2000);
        assert_eq!(settings.model, "hermes-3-llama-3.1-8b");
    }
}
