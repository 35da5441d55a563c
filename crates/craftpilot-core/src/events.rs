use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::{PlannerMode, Timestamp};

/// All domain events that can occur in the Craftpilot system.
///
/// Events are emitted after state changes and consumed by:
/// - The SSE broadcast channel (for real-time UI updates)
/// - The log (for audit/debugging)
#[derive(Clone, Debug, Serialize, Deserialize)]
#[non_exhaustive]
pub enum DomainEvent {
    // =========================================================================
    // Endpoint Events
    // =========================================================================
    /// A game-client instance registered over the gateway.
    EndpointRegistered {
        instance_id: String,
        connection_id: Uuid,
        timestamp: Timestamp,
    },

    /// A connection closed and its registry entry was removed.
    EndpointDisconnected {
        instance_id: String,
        timestamp: Timestamp,
    },

    /// An instance was designated as the dispatch target.
    EndpointActivated {
        instance_id: String,
        timestamp: Timestamp,
    },

    /// An instance reported its game state. Informational only.
    StateUpdated {
        instance_id: String,
        data: serde_json::Value,
        timestamp: Timestamp,
    },

    /// An instance sent a free-form log line. Informational only.
    ModLogged {
        instance_id: String,
        message: String,
        timestamp: Timestamp,
    },

    // =========================================================================
    // Task Events
    // =========================================================================
    /// A prompt was accepted and a task entered processing.
    TaskStarted {
        prompt: String,
        mode: PlannerMode,
        timestamp: Timestamp,
    },

    /// One action was sent to the active instance.
    ActionDispatched {
        action_id: u64,
        verb: String,
        timestamp: Timestamp,
    },

    /// The outstanding action was acknowledged as complete.
    ActionCompleted {
        action_id: u64,
        timestamp: Timestamp,
    },

    /// The outstanding action was acknowledged as failed.
    ActionFailed {
        action_id: u64,
        reason: String,
        timestamp: Timestamp,
    },

    /// Every action of the task completed.
    TaskCompleted {
        actions_executed: usize,
        timestamp: Timestamp,
    },

    /// The task aborted with a retained failure reason.
    TaskFailed { reason: String, timestamp: Timestamp },

    /// The task was stopped by the caller.
    TaskStopped { timestamp: Timestamp },
}

impl DomainEvent {
    /// Returns the timestamp of the event.
    pub fn timestamp(&self) -> Timestamp {
        match self {
            DomainEvent::EndpointRegistered { timestamp, .. }
            | DomainEvent::EndpointDisconnected { timestamp, .. }
            | DomainEvent::EndpointActivated { timestamp, .. }
            | DomainEvent::StateUpdated { timestamp, .. }
            | DomainEvent::ModLogged { timestamp, .. }
            | DomainEvent::TaskStarted { timestamp, .. }
            | DomainEvent::ActionDispatched { timestamp, .. }
            | DomainEvent::ActionCompleted { timestamp, .. }
            | DomainEvent::ActionFailed { timestamp, .. }
            | DomainEvent::TaskCompleted { timestamp, .. }
            | DomainEvent::TaskFailed { timestamp, .. }
            | DomainEvent::TaskStopped { timestamp } => *timestamp,
        }
    }

    /// Returns a human-readable event name for logging and SSE.
    pub fn event_name(&self) -> &'static str {
        match self {
            DomainEvent::EndpointRegistered { .. } => "endpoint_registered",
            DomainEvent::EndpointDisconnected { .. } => "endpoint_disconnected",
            DomainEvent::EndpointActivated { .. } => "endpoint_activated",
            DomainEvent::StateUpdated { .. } => "state_updated",
            DomainEvent::ModLogged { .. } => "mod_logged",
            DomainEvent::TaskStarted { .. } => "task_started",
            DomainEvent::ActionDispatched { .. } => "action_dispatched",
            DomainEvent::ActionCompleted { .. } => "action_completed",
            DomainEvent::ActionFailed { .. } => "action_failed",
            DomainEvent::TaskCompleted { .. } => "task_completed",
            DomainEvent::TaskFailed { .. } => "task_failed",
            DomainEvent::TaskStopped { .. } => "task_stopped",
        }
    }
}
