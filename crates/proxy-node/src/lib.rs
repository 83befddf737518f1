//! Proxy node service.
//!
//! Hosts the proxy role coordinator for the desktop UI: keeps the directory
//! snapshot fresh and exposes role changes over a local HTTP API.

pub mod api;
pub mod config;
pub mod error;
pub mod logging;

pub use config::Config;
pub use error::NodeError;
