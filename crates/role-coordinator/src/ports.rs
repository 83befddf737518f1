//! Remote collaborators of the coordinator.

use async_trait::async_trait;
use directory_client::{DirectoryClient, DirectoryError, SelfOffering};
use proxy_control_client::{ControlError, ProxyControlClient};

#[cfg(test)]
use mockall::automock;

/// The directory service where proxies advertise themselves.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait DirectoryService: Send + Sync {
    async fn register(&self, offering: &SelfOffering) -> Result<(), DirectoryError>;

    /// Must succeed when nothing is registered.
    async fn deregister(&self) -> Result<(), DirectoryError>;

    async fn is_registered(&self) -> Result<bool, DirectoryError>;
}

/// The local process that serves proxy traffic.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait LocalProxyControl: Send + Sync {
    async fn start_serving(&self) -> Result<(), ControlError>;

    /// Must succeed when the proxy is already stopped.
    async fn stop_serving(&self) -> Result<(), ControlError>;
}

#[async_trait]
impl DirectoryService for DirectoryClient {
    async fn register(&self, offering: &SelfOffering) -> Result<(), DirectoryError> {
        DirectoryClient::register(self, offering).await
    }

    async fn deregister(&self) -> Result<(), DirectoryError> {
        DirectoryClient::deregister(self).await
    }

    async fn is_registered(&self) -> Result<bool, DirectoryError> {
        DirectoryClient::is_registered(self).await
    }
}

#[async_trait]
impl LocalProxyControl for ProxyControlClient {
    async fn start_serving(&self) -> Result<(), ControlError> {
        ProxyControlClient::start_serving(self).await
    }

    async fn stop_serving(&self) -> Result<(), ControlError> {
        ProxyControlClient::stop_serving(self).await
    }
}
