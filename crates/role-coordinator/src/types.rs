//! Role state types.

use chrono::{DateTime, Utc};
use directory_client::{ProxyOffering, SelfOffering};
use serde::Serialize;

/// The node's proxy role. Serving and connected are mutually exclusive.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(tag = "role", content = "offering", rename_all = "lowercase")]
pub enum RoleState {
    #[default]
    Idle,
    /// Registered with the directory and running the local proxy.
    Serving(SelfOffering),
    /// Routing through a remote peer's proxy.
    Connected(ProxyOffering),
}

impl RoleState {
    pub fn is_idle(&self) -> bool {
        matches!(self, RoleState::Idle)
    }

    pub fn is_serving(&self) -> bool {
        matches!(self, RoleState::Serving(_))
    }

    pub fn is_connected(&self) -> bool {
        matches!(self, RoleState::Connected(_))
    }
}

/// Step of the role transition currently in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PendingOperation {
    #[default]
    None,
    Registering,
    Starting,
    Deregistering,
    Stopping,
    Connecting,
    Disconnecting,
}

impl PendingOperation {
    pub fn is_none(&self) -> bool {
        matches!(self, PendingOperation::None)
    }
}

/// Everything a rendering layer needs to draw the proxy role.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoleStatus {
    pub state: RoleState,
    pub pending: PendingOperation,
    /// Set when the last teardown could not confirm remote cleanup.
    pub warning: Option<String>,
    /// When `state` last changed.
    pub since: DateTime<Utc>,
}

impl Default for RoleStatus {
    fn default() -> Self {
        Self {
            state: RoleState::Idle,
            pending: PendingOperation::None,
            warning: None,
            since: Utc::now(),
        }
    }
}
