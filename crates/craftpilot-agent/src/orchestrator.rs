//! Task orchestrator: owns the prompt-to-completion lifecycle.
//!
//! Coordinates the completion client, the response interpreter, and the
//! action dispatcher around the single current task. Errors anywhere in the
//! pipeline are caught here, moved onto the task as a retained failure, and
//! returned as a structured result.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::{debug, info};

use craftpilot_core::events::DomainEvent;
use craftpilot_core::{OutboundMessage, TaskSettings, TaskState, Timestamp};

use crate::dispatcher::ActionDispatcher;
use crate::error::AgentError;
use crate::interpreter::interpret;
use crate::llm::{build_system_prompt, CompletionClient};
use crate::registry::ConnectionRegistry;
use crate::task::{TaskSnapshot, TaskStore};

/// Result of a finished submission.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskReport {
    pub state: TaskState,
    pub actions_executed: usize,
}

/// Snapshot returned by `status()`. Pure read, no side effects.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusReport {
    pub state: TaskState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task: Option<TaskSnapshot>,
    pub connected_instances: Vec<String>,
    pub active_instance: Option<String>,
}

/// Coordinates registry, interpreter, and dispatcher around one task.
pub struct Orchestrator {
    registry: Arc<ConnectionRegistry>,
    store: Arc<TaskStore>,
    dispatcher: Arc<ActionDispatcher>,
    client: Arc<dyn CompletionClient>,
    events: broadcast::Sender<DomainEvent>,
}

impl Orchestrator {
    pub fn new(
        registry: Arc<ConnectionRegistry>,
        store: Arc<TaskStore>,
        dispatcher: Arc<ActionDispatcher>,
        client: Arc<dyn CompletionClient>,
        events: broadcast::Sender<DomainEvent>,
    ) -> Self {
        Self {
            registry,
            store,
            dispatcher,
            client,
            events,
        }
    }

    /// Submit a prompt and drive it to a terminal state.
    ///
    /// Fails with `NoActiveEndpoint` before any task is created when no
    /// instance is activated, so the lifecycle is left untouched. Pipeline
    /// failures end the task in `error` with the reason retained on the
    /// snapshot.
    pub async fn submit(
        &self,
        prompt: &str,
        settings: TaskSettings,
    ) -> Result<TaskReport, AgentError> {
        if !self.registry.has_active() {
            return Err(AgentError::NoActiveEndpoint);
        }

        self.store.begin(prompt, settings.clone())?;
        info!(mode = %settings.mode, "Task started");
        let _ = self.events.send(DomainEvent::TaskStarted {
            prompt: prompt.to_string(),
            mode: settings.mode,
            timestamp: Timestamp::now(),
        });

        match self.run(prompt, &settings).await {
            Ok(actions_executed) => {
                // A stop that landed between actions leaves the task
                // `stopped`; everything else is a full completion.
                if self.store.is_stopped() {
                    return Ok(TaskReport {
                        state: TaskState::Stopped,
                        actions_executed,
                    });
                }
                self.store.transition(TaskState::Complete)?;
                info!(actions_executed, "Task complete");
                let _ = self.events.send(DomainEvent::TaskCompleted {
                    actions_executed,
                    timestamp: Timestamp::now(),
                });
                Ok(TaskReport {
                    state: TaskState::Complete,
                    actions_executed,
                })
            }
            Err(e) => {
                let reason = e.to_string();
                self.store.record_failure(&reason);
                let _ = self.events.send(DomainEvent::TaskFailed {
                    reason,
                    timestamp: Timestamp::now(),
                });
                Err(e)
            }
        }
    }

    async fn run(&self, prompt: &str, settings: &TaskSettings) -> Result<usize, AgentError> {
        let system_prompt = build_system_prompt(settings.mode);
        let raw = self.client.complete(&system_prompt, prompt, settings).await?;
        debug!(response_len = raw.len(), "Completion received");

        let drafts = interpret(&raw)?;
        self.store.set_total_actions(drafts.len());
        self.dispatcher.dispatch(drafts).await
    }

    /// Stop the current task. Valid only while `processing`.
    ///
    /// Sends a best-effort `stop` to the active endpoint; the dispatcher's
    /// checkpoint guarantees no further action is sent.
    pub fn request_stop(&self) -> Result<(), AgentError> {
        if self.store.state() != TaskState::Processing {
            return Err(AgentError::NoTaskRunning);
        }
        self.store.transition(TaskState::Stopped)?;

        if let Err(e) = self.registry.send_to_active(OutboundMessage::Stop) {
            debug!(error = %e, "Stop notification not delivered");
        }
        info!("Task stopped by caller");
        let _ = self.events.send(DomainEvent::TaskStopped {
            timestamp: Timestamp::now(),
        });
        Ok(())
    }

    /// Current lifecycle state, task snapshot, and endpoint inventory.
    pub fn status(&self) -> StatusReport {
        StatusReport {
            state: self.store.state(),
            task: self.store.snapshot(),
            connected_instances: self.registry.instance_ids(),
            active_instance: self.registry.active_id(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatcher::AckOutcome;
    use async_trait::async_trait;
    use craftpilot_core::PlannerMode;
    use tokio::sync::mpsc::UnboundedReceiver;
    use uuid::Uuid;

    struct CannedClient {
        response: String,
    }

    #[async_trait]
    impl CompletionClient for CannedClient {
        async fn complete(
            &self,
            _system_prompt: &str,
            _user_prompt: &str,
            _settings: &TaskSettings,
        ) -> Result<String, AgentError> {
            Ok(self.response.clone())
        }
    }

    struct Harness {
        orchestrator: Arc<Orchestrator>,
        dispatcher: Arc<ActionDispatcher>,
        rx: UnboundedReceiver<OutboundMessage>,
    }

    fn make_harness(response: &str, timeout_ms: u64, with_endpoint: bool) -> Harness {
        let registry = Arc::new(ConnectionRegistry::new());
        let store = Arc::new(TaskStore::new());
        let (events, _) = broadcast::channel(64);
        let dispatcher = Arc::new(ActionDispatcher::new(
            registry.clone(),
            store.clone(),
            timeout_ms,
            events.clone(),
        ));
        let client = Arc::new(CannedClient {
            response: response.to_string(),
        });
        let orchestrator = Arc::new(Orchestrator::new(
            registry.clone(),
            store,
            dispatcher.clone(),
            client,
            events,
        ));

        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        if with_endpoint {
            registry.register("instance_1", Uuid::new_v4(), tx);
            registry.activate("instance_1").unwrap();
            assert_eq!(
                rx.try_recv().unwrap(),
                OutboundMessage::Registered { success: true }
            );
        }

        Harness {
            orchestrator,
            dispatcher,
            rx,
        }
    }

    /// Acknowledge every dispatched action as complete.
    fn spawn_auto_responder(
        mut rx: UnboundedReceiver<OutboundMessage>,
        dispatcher: Arc<ActionDispatcher>,
    ) {
        tokio::spawn(async move {
            while let Some(message) = rx.recv().await {
                if let OutboundMessage::ExecuteAction { action } = message {
                    let id = action["id"].as_u64().unwrap();
                    dispatcher.resolve(id, AckOutcome::Complete(None));
                }
            }
        });
    }

    #[tokio::test]
    async fn test_mine_scenario_completes() {
        let response =
            r#"Sure! {"commands":[{"action":"mine","target":"diamond_ore","quantity":5}]}"#;
        let harness = make_harness(response, 1_000, true);
        spawn_auto_responder(harness.rx, harness.dispatcher.clone());

        let report = harness
            .orchestrator
            .submit("mine 5 diamonds", TaskSettings::default())
            .await
            .unwrap();
        assert_eq!(report.state, TaskState::Complete);
        assert_eq!(report.actions_executed, 1);

        let status = harness.orchestrator.status();
        assert_eq!(status.state, TaskState::Complete);
        assert_eq!(status.task.unwrap().completed_actions, 1);
    }

    #[tokio::test]
    async fn test_submit_without_active_endpoint_leaves_idle() {
        let harness = make_harness(r#"{"actions": []}"#, 1_000, false);

        let err = harness
            .orchestrator
            .submit("do something", TaskSettings::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AgentError::NoActiveEndpoint));

        let status = harness.orchestrator.status();
        assert_eq!(status.state, TaskState::Idle);
        assert!(status.task.is_none());
    }

    #[tokio::test]
    async fn test_unstructured_response_ends_in_error() {
        let harness = make_harness("I cannot help with that.", 1_000, true);

        let err = harness
            .orchestrator
            .submit("mine", TaskSettings::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AgentError::NoStructuredPayload));

        let status = harness.orchestrator.status();
        assert_eq!(status.state, TaskState::Error);
        assert!(status
            .task
            .unwrap()
            .failure
            .unwrap()
            .contains("No structured payload"));
    }

    #[tokio::test]
    async fn test_unanswered_action_times_out_into_error() {
        let response = r#"{"actions": [{"type": "mine"}]}"#;
        let harness = make_harness(response, 50, true);
        // No responder: the acknowledgement never arrives.

        let err = harness
            .orchestrator
            .submit("mine", TaskSettings::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AgentError::ActionTimeout { timeout_ms: 50, .. }));
        assert_eq!(harness.orchestrator.status().state, TaskState::Error);
    }

    #[tokio::test]
    async fn test_unknown_shape_completes_with_zero_actions() {
        let harness = make_harness(r#"{"thoughts": "hmm"}"#, 1_000, true);

        let report = harness
            .orchestrator
            .submit("think", TaskSettings::default())
            .await
            .unwrap();
        assert_eq!(report.state, TaskState::Complete);
        assert_eq!(report.actions_executed, 0);
    }

    #[tokio::test]
    async fn test_stop_during_processing() {
        let response = r#"{"actions": [{"type": "goto"}, {"type": "mine"}, {"type": "craft"}]}"#;
        let mut harness = make_harness(response, 1_000, true);

        let orchestrator = harness.orchestrator.clone();
        let worker = tokio::spawn(async move {
            orchestrator
                .submit("long task", TaskSettings::default())
                .await
        });

        // First action goes out; stop before acknowledging it.
        let first = harness.rx.recv().await.unwrap();
        let first_id = match &first {
            OutboundMessage::ExecuteAction { action } => action["id"].as_u64().unwrap(),
            other => panic!("unexpected: {:?}", other),
        };
        harness.orchestrator.request_stop().unwrap();

        // The best-effort stop notification reaches the endpoint.
        assert_eq!(harness.rx.recv().await.unwrap(), OutboundMessage::Stop);

        harness
            .dispatcher
            .resolve(first_id, AckOutcome::Complete(None));

        let report = worker.await.unwrap().unwrap();
        assert_eq!(report.state, TaskState::Stopped);
        assert_eq!(report.actions_executed, 1);

        // No further execute_action after the stop took effect.
        assert!(harness.rx.try_recv().is_err());
        assert_eq!(harness.orchestrator.status().state, TaskState::Stopped);
    }

    #[tokio::test]
    async fn test_stop_outside_processing_fails() {
        let harness = make_harness(r#"{"actions": []}"#, 1_000, true);
        assert!(matches!(
            harness.orchestrator.request_stop(),
            Err(AgentError::NoTaskRunning)
        ));
    }

    #[tokio::test]
    async fn test_status_reports_endpoints() {
        let harness = make_harness(r#"{"actions": []}"#, 1_000, true);
        let status = harness.orchestrator.status();
        assert_eq!(status.connected_instances, vec!["instance_1"]);
        assert_eq!(status.active_instance.as_deref(), Some("instance_1"));
        assert_eq!(status.state, TaskState::Idle);
    }

    #[tokio::test]
    async fn test_terminal_state_accepts_new_submission() {
        let response =
            r#"{"commands":[{"action":"mine","target":"iron_ore","quantity":1}]}"#;
        let harness = make_harness(response, 1_000, true);
        spawn_auto_responder(harness.rx, harness.dispatcher.clone());

        let first = harness
            .orchestrator
            .submit("first", TaskSettings::default())
            .await
            .unwrap();
        assert_eq!(first.state, TaskState::Complete);

        let second = harness
            .orchestrator
            .submit("second", TaskSettings::default())
            .await
            .unwrap();
        assert_eq!(second.state, TaskState::Complete);
        assert_eq!(
            harness.orchestrator.status().task.unwrap().prompt,
            "second"
        );
    }

    #[tokio::test]
    async fn test_planner_mode_reaches_status_snapshot() {
        let harness = make_harness(r#"{"actions": []}"#, 1_000, true);
        let settings = TaskSettings {
            mode: PlannerMode::LowLevel,
            ..TaskSettings::default()
        };
        harness.orchestrator.submit("p", settings).await.unwrap();
        assert_eq!(
            harness.orchestrator.status().task.unwrap().settings.mode,
            PlannerMode::LowLevel
        );
    }
}
