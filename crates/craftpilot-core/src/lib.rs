pub mod config;
pub mod error;
pub mod events;
pub mod protocol;
pub mod types;

pub use config::CraftConfig;
pub use error::{CraftError, Result};
pub use protocol::{ActionDescriptor, ActionDraft, InboundMessage, OutboundMessage};
pub use types::*;
