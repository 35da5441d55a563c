//! Connection registry: maps instance identifiers to live outbound channels.
//!
//! The registry owns at most one entry per identifier and tracks which
//! single instance is the active dispatch target.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use tokio::sync::mpsc::UnboundedSender;
use uuid::Uuid;

use craftpilot_core::OutboundMessage;

use crate::error::AgentError;

/// One connected instance's outbound channel plus its connection identity.
#[derive(Clone, Debug)]
pub struct ConnectionHandle {
    /// Identity of the underlying socket, used to unregister on close.
    pub connection_id: Uuid,
    sender: UnboundedSender<OutboundMessage>,
}

#[derive(Default)]
struct RegistryInner {
    endpoints: HashMap<String, ConnectionHandle>,
    active: Option<String>,
}

/// Registry of connected game-client instances.
#[derive(Default)]
pub struct ConnectionRegistry {
    inner: Mutex<RegistryInner>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, RegistryInner> {
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Store or replace the entry for `instance_id` and acknowledge the
    /// registering endpoint with a `registered` reply.
    pub fn register(
        &self,
        instance_id: &str,
        connection_id: Uuid,
        sender: UnboundedSender<OutboundMessage>,
    ) {
        let replaced = {
            let mut inner = self.lock();
            inner
                .endpoints
                .insert(
                    instance_id.to_string(),
                    ConnectionHandle {
                        connection_id,
                        sender: sender.clone(),
                    },
                )
                .is_some()
        };
        if replaced {
            tracing::info!(instance_id, "Instance re-registered, replacing entry");
        } else {
            tracing::info!(instance_id, %connection_id, "Instance registered");
        }

        // Best effort: a closed channel here is handled by unregister later.
        let _ = sender.send(OutboundMessage::Registered { success: true });
    }

    /// Remove any entry owned by `connection_id`, tolerating a connection
    /// that was never registered. Returns the removed instance identifier.
    pub fn unregister(&self, connection_id: Uuid) -> Option<String> {
        let mut inner = self.lock();
        let instance_id = inner
            .endpoints
            .iter()
            .find(|(_, handle)| handle.connection_id == connection_id)
            .map(|(id, _)| id.clone())?;

        inner.endpoints.remove(&instance_id);
        if inner.active.as_deref() == Some(instance_id.as_str()) {
            inner.active = None;
        }
        tracing::info!(instance_id, "Instance unregistered");
        Some(instance_id)
    }

    /// Return the live channel for `instance_id`, if registered.
    pub fn lookup(&self, instance_id: &str) -> Option<UnboundedSender<OutboundMessage>> {
        self.lock()
            .endpoints
            .get(instance_id)
            .map(|handle| handle.sender.clone())
    }

    /// Designate the single active dispatch target.
    ///
    /// Sends nothing to the endpoint; it only changes which channel future
    /// dispatches use.
    pub fn activate(&self, instance_id: &str) -> Result<(), AgentError> {
        let mut inner = self.lock();
        if !inner.endpoints.contains_key(instance_id) {
            return Err(AgentError::EndpointNotFound(instance_id.to_string()));
        }
        inner.active = Some(instance_id.to_string());
        tracing::info!(instance_id, "Instance activated");
        Ok(())
    }

    /// The identifier of the active instance, if any.
    pub fn active_id(&self) -> Option<String> {
        self.lock().active.clone()
    }

    /// Whether an active dispatch target is currently designated.
    pub fn has_active(&self) -> bool {
        self.lock().active.is_some()
    }

    /// Send a message to the active instance's channel.
    pub fn send_to_active(&self, message: OutboundMessage) -> Result<(), AgentError> {
        let sender = {
            let inner = self.lock();
            let active = inner.active.as_ref().ok_or(AgentError::NoActiveConnection)?;
            inner
                .endpoints
                .get(active)
                .ok_or(AgentError::NoActiveConnection)?
                .sender
                .clone()
        };
        sender
            .send(message)
            .map_err(|_| AgentError::NoActiveConnection)
    }

    /// All registered instance identifiers, sorted for stable output.
    pub fn instance_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.lock().endpoints.keys().cloned().collect();
        ids.sort();
        ids
    }
}
