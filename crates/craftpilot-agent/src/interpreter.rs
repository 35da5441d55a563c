//! Response interpreter: model prose in, ordered action drafts out.
//!
//! The model is asked for JSON but usually wraps it in prose. The
//! interpreter locates the first balanced brace-delimited fragment, parses
//! it, and normalizes the three recognized payload shapes into one flat
//! ordered list:
//! - `commands`: flat list of high-level command objects
//! - `actions`: flat list of step-by-step action objects
//! - `plan`: goal objects with nested `actions`, flattened in goal order

use serde_json::Value;
use tracing::warn;

use craftpilot_core::ActionDraft;

use crate::error::AgentError;

/// Locate the first top-level balanced `{...}` fragment in `raw`.
///
/// Brace counting is string- and escape-aware so braces inside JSON string
/// values do not terminate the fragment early.
fn extract_fragment(raw: &str) -> Option<&str> {
    let start = raw.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in raw[start..].char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match ch {
            '\\' if in_string => escaped = true,
            '"' => in_string = !in_string,
            '{' if !in_string => depth += 1,
            '}' if !in_string => {
                depth -= 1;
                if depth == 0 {
                    return Some(&raw[start..start + offset + ch.len_utf8()]);
                }
            }
            _ => {}
        }
    }
    None
}

/// Collect the objects of a payload list into drafts, skipping non-objects.
fn drafts_from_list(list: &[Value]) -> Vec<ActionDraft> {
    list.iter()
        .filter_map(|entry| match entry {
            Value::Object(obj) => Some(ActionDraft::from_object(obj.clone())),
            other => {
                warn!(?other, "Skipping non-object entry in action list");
                None
            }
        })
        .collect()
}

/// Interpret a raw model response into an ordered list of action drafts.
///
/// Fails with `NoStructuredPayload` when no balanced fragment exists and
/// with `MalformedPayload` when the fragment is not valid JSON. A parseable
/// object matching none of the three shapes yields an empty list.
pub fn interpret(raw: &str) -> Result<Vec<ActionDraft>, AgentError> {
    let fragment = extract_fragment(raw).ok_or(AgentError::NoStructuredPayload)?;
    let parsed: Value =
        serde_json::from_str(fragment).map_err(|e| AgentError::MalformedPayload(e.to_string()))?;

    if let Some(commands) = parsed.get("commands") {
        let list = commands
            .as_array()
            .ok_or_else(|| AgentError::MalformedPayload("'commands' is not a list".into()))?;
        return Ok(drafts_from_list(list));
    }

    if let Some(actions) = parsed.get("actions") {
        let list = actions
            .as_array()
            .ok_or_else(|| AgentError::MalformedPayload("'actions' is not a list".into()))?;
        return Ok(drafts_from_list(list));
    }

    if let Some(plan) = parsed.get("plan") {
        let goals = plan
            .as_array()
            .ok_or_else(|| AgentError::MalformedPayload("'plan' is not a list".into()))?;
        let mut drafts = Vec::new();
        for goal in goals {
            if let Some(actions) = goal.get("actions").and_then(Value::as_array) {
                drafts.extend(drafts_from_list(actions));
            }
        }
        return Ok(drafts);
    }

    warn!("Model payload matched none of commands/actions/plan; treating as empty");
    Ok(Vec::new())
}
