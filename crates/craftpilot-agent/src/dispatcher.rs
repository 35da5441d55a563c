//! Action dispatcher: one in-flight action at a time.
//!
//! Each action gets a fresh identifier, is sent to the active endpoint, and
//! the loop blocks until a matching acknowledgement arrives or the timeout
//! elapses. Correlation is a single-slot pending entry rather than an event
//! subscription, so mismatched or stale acknowledgements are simply ignored
//! and a timely acknowledgement always cancels the timer.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use serde_json::Value;
use tokio::sync::{broadcast, oneshot};
use tracing::{debug, info, warn};

use craftpilot_core::events::DomainEvent;
use craftpilot_core::{ActionDraft, OutboundMessage, Timestamp};

use crate::error::AgentError;
use crate::registry::ConnectionRegistry;
use crate::task::TaskStore;

/// Outcome of one dispatched action, as reported by the remote endpoint.
#[derive(Debug)]
pub enum AckOutcome {
    Complete(Option<Value>),
    Failed(String),
}

struct PendingAck {
    action_id: u64,
    tx: oneshot::Sender<AckOutcome>,
}

/// Sequentially drains an action list against the active endpoint.
pub struct ActionDispatcher {
    registry: Arc<ConnectionRegistry>,
    store: Arc<TaskStore>,
    pending: Mutex<Option<PendingAck>>,
    next_id: AtomicU64,
    timeout_ms: u64,
    events: broadcast::Sender<DomainEvent>,
}

impl ActionDispatcher {
    pub fn new(
        registry: Arc<ConnectionRegistry>,
        store: Arc<TaskStore>,
        timeout_ms: u64,
        events: broadcast::Sender<DomainEvent>,
    ) -> Self {
        Self {
            registry,
            store,
            pending: Mutex::new(None),
            // Identifiers are never reset, so an acknowledgement from a
            // previous task can never match the current outstanding action.
            next_id: AtomicU64::new(1),
            timeout_ms,
            events,
        }
    }

    fn lock_pending(&self) -> MutexGuard<'_, Option<PendingAck>> {
        match self.pending.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Resolve the outstanding action if `action_id` matches it.
    ///
    /// Acknowledgements for any other identifier are discarded.
    pub fn resolve(&self, action_id: u64, outcome: AckOutcome) {
        let mut slot = self.lock_pending();
        match slot.take() {
            Some(pending) if pending.action_id == action_id => {
                // The receiver is dropped on timeout; nothing to do then.
                let _ = pending.tx.send(outcome);
            }
            other => {
                debug!(action_id, "Ignoring acknowledgement for non-outstanding action");
                *slot = other;
            }
        }
    }

    /// Dispatch the drafts in order, one outstanding action at a time.
    ///
    /// Halts without sending further actions when the task has been stopped.
    /// Returns the number of actions acknowledged as complete.
    pub async fn dispatch(&self, drafts: Vec<ActionDraft>) -> Result<usize, AgentError> {
        let mut completed = 0usize;

        for draft in drafts {
            // Cooperative cancellation checkpoint: an action already in
            // flight on the remote side cannot be undone, but no further
            // action is sent once the task is stopped.
            if self.store.is_stopped() {
                info!("Task stopped; halting before next action");
                break;
            }

            let action_id = self.next_id.fetch_add(1, Ordering::Relaxed);
            let verb = draft.verb.clone();
            let descriptor = draft.assign(action_id);

            let (tx, rx) = oneshot::channel();
            *self.lock_pending() = Some(PendingAck { action_id, tx });

            if let Err(e) = self.registry.send_to_active(OutboundMessage::ExecuteAction {
                action: descriptor.to_wire(),
            }) {
                *self.lock_pending() = None;
                return Err(e);
            }
            debug!(action_id, verb, "Action dispatched");
            let _ = self.events.send(DomainEvent::ActionDispatched {
                action_id,
                verb: verb.clone(),
                timestamp: Timestamp::now(),
            });

            match tokio::time::timeout(Duration::from_millis(self.timeout_ms), rx).await {
                Ok(Ok(AckOutcome::Complete(_result))) => {
                    completed += 1;
                    self.store.record_completed_action();
                    let _ = self.events.send(DomainEvent::ActionCompleted {
                        action_id,
                        timestamp: Timestamp::now(),
                    });
                }
                Ok(Ok(AckOutcome::Failed(reason))) => {
                    let _ = self.events.send(DomainEvent::ActionFailed {
                        action_id,
                        reason: reason.clone(),
                        timestamp: Timestamp::now(),
                    });
                    return Err(AgentError::ActionFailed { action_id, reason });
                }
                Ok(Err(_)) => return Err(AgentError::ChannelClosed),
                Err(_) => {
                    *self.lock_pending() = None;
                    warn!(action_id, timeout_ms = self.timeout_ms, "Action timed out");
                    return Err(AgentError::ActionTimeout {
                        action_id,
                        timeout_ms: self.timeout_ms,
                    });
                }
            }
        }

        Ok(completed)
    }
}
