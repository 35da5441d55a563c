use thiserror::Error;

/// Top-level error type for the Craftpilot system.
///
/// Each variant wraps a subsystem-specific error. Subsystem crates define
/// their own error types and implement `From<SubsystemError> for CraftError`
/// so that the `?` operator works seamlessly across crate boundaries.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CraftError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Agent error: {0}")]
    Agent(String),

    #[error("Gateway error: {0}")]
    Gateway(String),

    #[error("Detection error: {0}")]
    Detect(String),

    #[error("API error: {0}")]
    Api(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<toml::de::Error> for CraftError {
    fn from(err: toml::de::Error) -> Self {
        CraftError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for CraftError {
    fn from(err: toml::ser::Error) -> Self {
        CraftError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for CraftError {
    fn from(err: serde_json::Error) -> Self {
        CraftError::Serialization(err.to_string())
    }
}

/// A specialized `Result` type for Craftpilot operations.
pub type Result<T> = std::result::Result<T, CraftError>;
