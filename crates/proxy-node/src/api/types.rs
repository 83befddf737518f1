//! API request and response types.

use chrono::{DateTime, Utc};
use directory_client::ProxyOffering;
use serde::Serialize;

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub directory_healthy: bool,
    pub control_healthy: bool,
}

/// Cached proxy directory.
#[derive(Debug, Serialize)]
pub struct ProxiesResponse {
    pub offerings: Vec<ProxyOffering>,
    pub total: usize,
    /// `None` until the directory has answered once.
    pub refreshed_at: Option<DateTime<Utc>>,
}
