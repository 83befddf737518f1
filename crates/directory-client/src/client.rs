//! Directory HTTP client.

use crate::error::DirectoryError;
use crate::types::*;
use chrono::Utc;
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, info, instrument, warn};

/// Client for the proxy directory service.
///
/// Clones share the cached offering snapshot.
#[derive(Clone)]
pub struct DirectoryClient {
    client: Client,
    base_url: String,
    snapshot: Arc<watch::Sender<Snapshot>>,
}

impl DirectoryClient {
    /// Create a new directory client. `timeout` bounds every request.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, DirectoryError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| DirectoryError::Client(e.to_string()))?;

        let (snapshot, _) = watch::channel(Snapshot::default());

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            snapshot: Arc::new(snapshot),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Current cached snapshot. Never touches the network.
    pub fn snapshot(&self) -> Snapshot {
        self.snapshot.borrow().clone()
    }

    /// Receiver notified whenever the snapshot is replaced.
    pub fn subscribe(&self) -> watch::Receiver<Snapshot> {
        self.snapshot.subscribe()
    }

    /// Check if the directory is reachable.
    pub async fn health_check(&self) -> bool {
        self.client
            .get(format!("{}/isProxy", self.base_url))
            .send()
            .await
            .map(|r| r.status().is_success())
            .unwrap_or(false)
    }

    /// Fetch the current directory contents without touching the cache.
    #[instrument(skip(self))]
    pub async fn fetch_offerings(&self) -> Result<Vec<ProxyOffering>, DirectoryError> {
        let response = self
            .client
            .get(format!("{}/fetchProxyList", self.base_url))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let msg = response.text().await.unwrap_or_default();
            return Err(DirectoryError::Unavailable(format!("{}: {}", status, msg)));
        }

        // The directory encodes an empty list as `null`.
        let body = response.text().await?;
        let offerings: Option<Vec<ProxyOffering>> = serde_json::from_str(&body)?;
        let offerings = offerings.unwrap_or_default();
        debug!("Fetched {} offerings", offerings.len());
        Ok(offerings)
    }

    /// Refresh the cached snapshot and return it.
    ///
    /// On failure the previous snapshot is returned unchanged along with the
    /// error, which is only meant for logging.
    pub async fn list_offerings(&self) -> Listing {
        match self.fetch_offerings().await {
            Ok(offerings) => {
                let snapshot = Snapshot {
                    offerings: Arc::new(offerings),
                    refreshed_at: Some(Utc::now()),
                };
                self.snapshot.send_replace(snapshot.clone());
                Listing {
                    snapshot,
                    stale: None,
                }
            }
            Err(e) => {
                warn!("Directory refresh failed, keeping previous snapshot: {}", e);
                Listing {
                    snapshot: self.snapshot(),
                    stale: Some(e),
                }
            }
        }
    }

    /// Advertise this node as a proxy. Not retried.
    #[instrument(skip(self, offering), fields(name = %offering.name))]
    pub async fn register(&self, offering: &SelfOffering) -> Result<(), DirectoryError> {
        self.post_registration(&RegistrationRequest::register(offering))
            .await?;
        info!(
            "Registered as proxy (initial_fee={}, rate={})",
            offering.initial_fee, offering.rate
        );
        Ok(())
    }

    /// Withdraw this node's advertisement. The directory treats this as a
    /// no-op when nothing is registered.
    #[instrument(skip(self))]
    pub async fn deregister(&self) -> Result<(), DirectoryError> {
        self.post_registration(&RegistrationRequest::deregister())
            .await?;
        info!("Deregistered as proxy");
        Ok(())
    }

    /// Whether the directory currently lists this node as a proxy.
    #[instrument(skip(self))]
    pub async fn is_registered(&self) -> Result<bool, DirectoryError> {
        let response = self
            .client
            .get(format!("{}/isProxy", self.base_url))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let msg = response.text().await.unwrap_or_default();
            return Err(DirectoryError::Unavailable(format!("{}: {}", status, msg)));
        }

        let status: RegistrationStatus = response.json().await?;
        Ok(status.is_proxy)
    }

    async fn post_registration(&self, request: &RegistrationRequest) -> Result<(), DirectoryError> {
        let response = self
            .client
            .post(format!("{}/registerProxy", self.base_url))
            .json(request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let msg = response.text().await.unwrap_or_default();
            warn!("Directory rejected {:?}: {} {}", request.action, status, msg);
            return Err(DirectoryError::Unavailable(format!("{}: {}", status, msg)));
        }

        Ok(())
    }
}
