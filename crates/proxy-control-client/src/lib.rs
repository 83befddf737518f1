//! Client for the local proxy process controller.

mod client;
mod error;

pub use client::ProxyControlClient;
pub use error::ControlError;
