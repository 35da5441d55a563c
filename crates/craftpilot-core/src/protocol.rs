//! Wire protocol shared between the gateway and the agent.
//!
//! Every message carries a `type` discriminator. Field names use the casing
//! the in-game mod sends (`instanceId`, `actionId`).

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// =============================================================================
// Action descriptors
// =============================================================================

/// A normalized unit of remote work before the dispatcher assigns its id.
///
/// `payload` is the original object as the model produced it, verb key
/// included; parameters are deliberately not validated here.
#[derive(Clone, Debug, PartialEq)]
pub struct ActionDraft {
    /// Verb of the action, taken from the object's `action` key, falling
    /// back to `type`.
    pub verb: String,
    /// The full original object.
    pub payload: Map<String, Value>,
}

impl ActionDraft {
    /// Build a draft from a parsed model-output object.
    pub fn from_object(payload: Map<String, Value>) -> Self {
        let verb = payload
            .get("action")
            .or_else(|| payload.get("type"))
            .and_then(Value::as_str)
            .unwrap_or("unknown")
            .to_string();
        Self { verb, payload }
    }

    /// Attach a dispatcher-assigned identifier.
    pub fn assign(self, id: u64) -> ActionDescriptor {
        ActionDescriptor {
            id,
            verb: self.verb,
            payload: self.payload,
        }
    }
}

/// A dispatchable action with its assigned identifier.
#[derive(Clone, Debug, PartialEq)]
pub struct ActionDescriptor {
    /// Identifier assigned by the dispatcher, unique across tasks.
    pub id: u64,
    pub verb: String,
    pub payload: Map<String, Value>,
}

impl ActionDescriptor {
    /// Wire encoding: the original object with the assigned `id` spread in.
    pub fn to_wire(&self) -> Value {
        let mut obj = self.payload.clone();
        obj.insert("id".to_string(), Value::from(self.id));
        Value::Object(obj)
    }
}

// =============================================================================
// Inbound messages (endpoint -> core)
// =============================================================================

/// Messages received from a connected game-client instance.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InboundMessage {
    /// An instance announces itself; the core replies `registered`.
    Register {
        #[serde(rename = "instanceId")]
        instance_id: String,
    },
    /// Periodic game-state report. Informational only.
    StateUpdate {
        #[serde(rename = "instanceId")]
        instance_id: String,
        #[serde(default)]
        data: Value,
    },
    /// The outstanding action finished successfully.
    ActionComplete {
        #[serde(rename = "actionId")]
        action_id: u64,
        #[serde(default)]
        result: Option<Value>,
    },
    /// The outstanding action failed on the remote side.
    ActionFailed {
        #[serde(rename = "actionId")]
        action_id: u64,
        error: String,
    },
    /// Free-form log line from the mod. Informational only.
    Log {
        #[serde(rename = "instanceId")]
        instance_id: String,
        message: String,
    },
    /// Any type the core does not recognize. Logged and ignored.
    #[serde(other)]
    Unknown,
}

// =============================================================================
// Outbound messages (core -> endpoint)
// =============================================================================

/// Messages sent to a connected game-client instance.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutboundMessage {
    /// Acknowledges a `register`.
    Registered { success: bool },
    /// Carries one action descriptor for execution.
    ExecuteAction { action: Value },
    /// Best-effort request to halt whatever is in flight.
    Stop,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn object(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            other => panic!("expected object, got {:?}", other),
        }
    }

    // =====================================================================
    // Action descriptors
    // =====================================================================

    #[test]
    fn test_draft_verb_from_action_key() {
        let draft = ActionDraft::from_object(object(json!(
            {"action": "mine", "target": "diamond_ore", "quantity": 5}
        )));
        assert_eq!(draft.verb, "mine");
    }

    #[test]
    fn test_draft_verb_falls_back_to_type_key() {
        let draft = ActionDraft::from_object(object(json!(
            {"type": "goto", "x": 100, "y": 64, "z": 200}
        )));
        assert_eq!(draft.verb, "goto");
    }

    #[test]
    fn test_draft_verb_prefers_action_over_type() {
        let draft = ActionDraft::from_object(object(json!(
            {"action": "craft", "type": "goal"}
        )));
        assert_eq!(draft.verb, "craft");
    }

    #[test]
    fn test_draft_without_verb_key() {
        let draft = ActionDraft::from_object(object(json!({"target": "oak_log"})));
        assert_eq!(draft.verb, "unknown");
    }

    #[test]
    fn test_descriptor_wire_spreads_id_into_payload() {
        let descriptor = ActionDraft::from_object(object(json!(
            {"action": "mine", "target": "diamond_ore"}
        )))
        .assign(7);
        let wire = descriptor.to_wire();
        assert_eq!(wire["id"], json!(7));
        assert_eq!(wire["action"], json!("mine"));
        assert_eq!(wire["target"], json!("diamond_ore"));
    }

    // =====================================================================
    // Inbound parsing
    // =====================================================================

    #[test]
    fn test_parse_register() {
        let msg: InboundMessage =
            serde_json::from_str(r#"{"type": "register", "instanceId": "instance_4242"}"#)
                .unwrap();
        assert_eq!(
            msg,
            InboundMessage::Register {
                instance_id: "instance_4242".to_string()
            }
        );
    }

    #[test]
    fn test_parse_state_update_with_and_without_data() {
        let with: InboundMessage = serde_json::from_str(
            r#"{"type": "state_update", "instanceId": "instance_1", "data": {"health": 20}}"#,
        )
        .unwrap();
        match with {
            InboundMessage::StateUpdate { instance_id, data } => {
                assert_eq!(instance_id, "instance_1");
                assert_eq!(data["health"], json!(20));
            }
            other => panic!("unexpected: {:?}", other),
        }

        let without: InboundMessage =
            serde_json::from_str(r#"{"type": "state_update", "instanceId": "instance_1"}"#)
                .unwrap();
        match without {
            InboundMessage::StateUpdate { data, .. } => assert!(data.is_null()),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_parse_action_complete() {
        let msg: InboundMessage = serde_json::from_str(
            r#"{"type": "action_complete", "actionId": 3, "result": {"mined": 5}}"#,
        )
        .unwrap();
        match msg {
            InboundMessage::ActionComplete { action_id, result } => {
                assert_eq!(action_id, 3);
                assert_eq!(result.unwrap()["mined"], json!(5));
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_parse_action_complete_without_result() {
        let msg: InboundMessage =
            serde_json::from_str(r#"{"type": "action_complete", "actionId": 9}"#).unwrap();
        assert_eq!(
            msg,
            InboundMessage::ActionComplete {
                action_id: 9,
                result: None
            }
        );
    }

    #[test]
    fn test_parse_action_failed() {
        let msg: InboundMessage = serde_json::from_str(
            r#"{"type": "action_failed", "actionId": 4, "error": "no path to target"}"#,
        )
        .unwrap();
        assert_eq!(
            msg,
            InboundMessage::ActionFailed {
                action_id: 4,
                error: "no path to target".to_string()
            }
        );
    }

    #[test]
    fn test_parse_log() {
        let msg: InboundMessage = serde_json::from_str(
            r#"{"type": "log", "instanceId": "instance_1", "message": "pathing"}"#,
        )
        .unwrap();
        assert_eq!(
            msg,
            InboundMessage::Log {
                instance_id: "instance_1".to_string(),
                message: "pathing".to_string()
            }
        );
    }

    #[test]
    fn test_parse_unknown_type_is_tolerated() {
        let msg: InboundMessage =
            serde_json::from_str(r#"{"type": "telemetry", "foo": 1}"#).unwrap();
        assert_eq!(msg, InboundMessage::Unknown);
    }

    #[test]
    fn test_parse_missing_type_is_an_error() {
        let result: std::result::Result<InboundMessage, _> =
            serde_json::from_str(r#"{"instanceId": "instance_1"}"#);
        assert!(result.is_err());
    }

    // =====================================================================
    // Outbound serialization
    // =====================================================================

    #[test]
    fn test_registered_wire_shape() {
        let json = serde_json::to_value(OutboundMessage::Registered { success: true }).unwrap();
        assert_eq!(json, json!({"type": "registered", "success": true}));
    }

    #[test]
    fn test_execute_action_wire_shape() {
        let descriptor = ActionDraft::from_object(object(json!(
            {"action": "mine", "target": "diamond_ore"}
        )))
        .assign(1);
        let json = serde_json::to_value(OutboundMessage::ExecuteAction {
            action: descriptor.to_wire(),
        })
        .unwrap();
        assert_eq!(json["type"], json!("execute_action"));
        assert_eq!(json["action"]["id"], json!(1));
        assert_eq!(json["action"]["action"], json!("mine"));
    }

    #[test]
    fn test_stop_wire_shape() {
        let json = serde_json::to_value(OutboundMessage::Stop).unwrap();
        assert_eq!(json, json!({"type": "stop"}));
    }
}
