use async_trait::async_trait;
use thiserror::Error;

use crate::core::assembler::TopLevelConfig;

/// Error type for config hand-off
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum SinkError {
    /// Error when writing the config fails
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Error when the config cannot be encoded
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Error when the sink target is unusable
    #[error("Invalid endpoint: {0}")]
    InvalidEndpoint(String),

    /// Error when the runtime cannot be reached
    #[error("Connection error: {0}")]
    Connection(String),

    /// Error when the runtime refuses the config
    #[error("Runtime rejected config with status {status}: {body}")]
    Rejected {
        /// The status code returned by the runtime
        status: u16,
        /// Response body, usually the runtime's explanation
        body: String,
    },
}

/// Result type alias for config hand-off
pub type SinkResult<T> = Result<T, SinkError>;

/// ConfigSink defines the port (interface) for handing a generated config to whatever
/// makes it live: a file the runtime is started with, or a running runtime's admin API.
#[async_trait]
pub trait ConfigSink: Send + Sync {
    /// Deliver the config
    ///
    /// # Arguments
    /// * `config` - The assembled configuration
    async fn emit(&self, config: &TopLevelConfig) -> SinkResult<()>;

    /// Human readable destination, used in logs
    fn describe(&self) -> String;
}
