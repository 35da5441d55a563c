//! WebSocket gateway for game-client connections.
//!
//! Accepts connections from the in-game mod, pairs each with an outbound
//! channel, and routes inbound protocol messages into the registry and
//! the dispatcher.

pub mod router;
pub mod server;

pub use router::MessageRouter;
pub use server::start_gateway;
