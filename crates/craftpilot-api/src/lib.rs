//! REST API for the Craftpilot UI.
//!
//! Exposes status, prompt submission, stop, instance discovery and
//! activation, plus an SSE stream of domain events.

pub mod error;
pub mod handlers;
pub mod routes;
pub mod state;

pub use routes::{create_router, start_server};
pub use state::AppState;
