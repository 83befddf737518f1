//! Local proxy controller HTTP client.

use crate::error::ControlError;
use reqwest::Client;
use std::time::Duration;
use tracing::{info, instrument, warn};

/// Client for the process that actually serves proxy traffic.
#[derive(Clone)]
pub struct ProxyControlClient {
    client: Client,
    base_url: String,
}

impl ProxyControlClient {
    /// Create a new control client. `timeout` bounds every request.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ControlError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ControlError::Client(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// The controller has no health route; any HTTP answer means it is up.
    pub async fn health_check(&self) -> bool {
        self.client
            .get(format!("{}/", self.base_url))
            .send()
            .await
            .is_ok()
    }

    /// Start accepting proxy connections.
    #[instrument(skip(self))]
    pub async fn start_serving(&self) -> Result<(), ControlError> {
        self.command("startProxy").await?;
        info!("Local proxy started");
        Ok(())
    }

    /// Stop the local proxy. Stopping a stopped proxy succeeds.
    #[instrument(skip(self))]
    pub async fn stop_serving(&self) -> Result<(), ControlError> {
        self.command("stopProxy").await?;
        info!("Local proxy stopped");
        Ok(())
    }

    async fn command(&self, route: &str) -> Result<(), ControlError> {
        let response = self
            .client
            .post(format!("{}/{}", self.base_url, route))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let msg = response.text().await.unwrap_or_default();
            warn!("{} failed: {} {}", route, status, msg.trim());
            return Err(ControlError::Unavailable(format!("{}: {}", status, msg.trim())));
        }

        Ok(())
    }
}
