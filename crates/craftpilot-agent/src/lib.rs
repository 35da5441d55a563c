//! Task orchestration core for Craftpilot.
//!
//! Turns a natural-language prompt into an ordered list of remote-control
//! actions and dispatches them one at a time to a connected game-client
//! instance, with per-action acknowledgement, timeout, and cooperative
//! cancellation.

pub mod dispatcher;
pub mod error;
pub mod interpreter;
pub mod llm;
pub mod orchestrator;
pub mod registry;
pub mod task;

pub use dispatcher::{AckOutcome, ActionDispatcher};
pub use error::AgentError;
pub use interpreter::interpret;
pub use llm::{build_system_prompt, CompletionClient, LmStudioClient};
pub use orchestrator::{Orchestrator, StatusReport, TaskReport};
pub use registry::ConnectionRegistry;
pub use task::{TaskSnapshot, TaskStore};
