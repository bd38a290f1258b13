pub mod config_sink;

pub use config_sink::{ConfigSink, SinkError, SinkResult};
