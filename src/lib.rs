//! php-fastcgi-gen - reverse proxy configuration for PHP FastCGI applications.
//!
//! Given where clients connect (`--from`), where the FastCGI process listens (`--to`) and
//! the document root (`--root`), this crate produces a complete JSON configuration for an
//! HTTP server runtime: a single server that redirects directory requests to their slash
//! form, rewrites pretty URLs to the front controller, and proxies script requests over
//! FastCGI. The admin endpoint of the generated config is disabled.
//!
//! # Quick Example
//! ```no_run
//! use php_fastcgi_gen::{Settings, synthesize_all};
//!
//! # fn main() -> eyre::Result<()> {
//! let synthesis = synthesize_all(
//!     Some("app.example.com"),
//!     "localhost:9000",
//!     "/var/www/html",
//!     &Settings::default(),
//! )?;
//! println!("{}", serde_json::to_string_pretty(&synthesis.config)?);
//! # Ok(()) }
//! ```
//!
//! # Architecture
//! The crate separates **ports** (traits) from **adapters** (implementations) while keeping
//! synthesis inside `core`. `core` is pure: it resolves addresses, builds the route
//! pipeline and assembles the document without touching the network or the filesystem.
//! Handing the document off (stdout, a file, a running runtime's admin API) is the job
//! of a [`ConfigSink`].
//!
//! # Error Handling
//! Synthesis returns [`SynthesisError`]; adapters return
//! [`SinkError`](ports::SinkError). The binary wraps both in `eyre` reports with context
//! attached via `WrapErr`.
pub mod cli;
pub mod config;
pub mod ports;
pub mod tracing_setup;

pub mod adapters;
pub mod core;

// Re-export the specific types needed by the binary crate
pub use crate::{
    adapters::{AdminApiSink, FileConfigSink, OutputTarget},
    config::models::Settings,
    core::{Address, SynthesisError, TopLevelConfig, synthesize_all},
    ports::config_sink::ConfigSink,
};
