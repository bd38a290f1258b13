pub mod config_sinks;

/// Re-export commonly used types from adapters
pub use config_sinks::{AdminApiSink, FileConfigSink, OutputTarget};
