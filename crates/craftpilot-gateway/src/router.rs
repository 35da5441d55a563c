//! Inbound message demultiplexer.
//!
//! Every message is dispatched on its `type` discriminator. Unknown types
//! and malformed payloads are logged and dropped; they never crash the
//! router or resolve the dispatcher's outstanding wait.

use std::sync::Arc;

use tokio::sync::broadcast;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, info, warn};
use uuid::Uuid;

use craftpilot_agent::dispatcher::{AckOutcome, ActionDispatcher};
use craftpilot_agent::registry::ConnectionRegistry;
use craftpilot_core::events::DomainEvent;
use craftpilot_core::{InboundMessage, OutboundMessage, Timestamp};

/// Routes inbound protocol messages to the registry and the dispatcher.
pub struct MessageRouter {
    registry: Arc<ConnectionRegistry>,
    dispatcher: Arc<ActionDispatcher>,
    events: broadcast::Sender<DomainEvent>,
}

impl MessageRouter {
    pub fn new(
        registry: Arc<ConnectionRegistry>,
        dispatcher: Arc<ActionDispatcher>,
        events: broadcast::Sender<DomainEvent>,
    ) -> Self {
        Self {
            registry,
            dispatcher,
            events,
        }
    }

    /// Parse and route one raw text frame from `connection_id`.
    pub fn route_text(
        &self,
        connection_id: Uuid,
        raw: &str,
        sender: &UnboundedSender<OutboundMessage>,
    ) {
        match serde_json::from_str::<InboundMessage>(raw) {
            Ok(message) => self.route(connection_id, message, sender),
            Err(e) => warn!(%connection_id, error = %e, "Dropping malformed message"),
        }
    }

    /// Route one parsed message.
    pub fn route(
        &self,
        connection_id: Uuid,
        message: InboundMessage,
        sender: &UnboundedSender<OutboundMessage>,
    ) {
        match message {
            InboundMessage::Register { instance_id } => {
                self.registry
                    .register(&instance_id, connection_id, sender.clone());
                let _ = self.events.send(DomainEvent::EndpointRegistered {
                    instance_id,
                    connection_id,
                    timestamp: Timestamp::now(),
                });
            }
            InboundMessage::StateUpdate { instance_id, data } => {
                debug!(instance_id, "State update received");
                let _ = self.events.send(DomainEvent::StateUpdated {
                    instance_id,
                    data,
                    timestamp: Timestamp::now(),
                });
            }
            InboundMessage::ActionComplete { action_id, result } => {
                self.dispatcher
                    .resolve(action_id, AckOutcome::Complete(result));
            }
            InboundMessage::ActionFailed { action_id, error } => {
                self.dispatcher.resolve(action_id, AckOutcome::Failed(error));
            }
            InboundMessage::Log {
                instance_id,
                message,
            } => {
                info!(instance_id, message, "Mod log");
                let _ = self.events.send(DomainEvent::ModLogged {
                    instance_id,
                    message,
                    timestamp: Timestamp::now(),
                });
            }
            InboundMessage::Unknown => {
                warn!(%connection_id, "Ignoring message with unknown type");
            }
        }
    }

    /// Tear down state for a closed connection.
    pub fn disconnected(&self, connection_id: Uuid) {
        if let Some(instance_id) = self.registry.unregister(connection_id) {
            let _ = self.events.send(DomainEvent::EndpointDisconnected {
                instance_id,
                timestamp: Timestamp::now(),
            });
        }
    }
}
