pub mod admin_api;
pub mod file;

pub use admin_api::AdminApiSink;
pub use file::{FileConfigSink, OutputTarget};
