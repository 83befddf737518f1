//! Role transition errors.

use directory_client::DirectoryError;
use proxy_control_client::ControlError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RoleError {
    #[error("Node is already serving or connected")]
    AlreadyActive,

    #[error("Already connected to a proxy, disconnect first")]
    AlreadyConnected,

    #[error("Another role change is in progress")]
    OperationInProgress,

    #[error("Node is not in the role this operation ends")]
    NotActive,

    #[error("Invalid offering: {0}")]
    InvalidOffering(String),

    /// Nothing was committed; the node is still idle.
    #[error("Registration with the directory failed: {0}")]
    RegistrationFailed(#[source] DirectoryError),

    /// The registration was withdrawn again; the node is still idle.
    #[error("Local proxy failed to start: {0}")]
    StartFailed(#[source] ControlError),

    /// The node is idle locally but the directory or the local proxy may
    /// still think otherwise.
    #[error(
        "Proxy role ended but remote cleanup was incomplete ({})",
        teardown_summary(.deregister, .stop)
    )]
    TeardownIncomplete {
        deregister: Option<DirectoryError>,
        stop: Option<ControlError>,
    },

    #[error("Reconciliation with the directory failed: {0}")]
    ReconcileFailed(#[source] DirectoryError),

    /// The runtime shut down while the change was running.
    #[error("Role change interrupted by shutdown")]
    Interrupted,
}

fn teardown_summary(deregister: &Option<DirectoryError>, stop: &Option<ControlError>) -> String {
    let mut parts = Vec::new();
    if let Some(e) = deregister {
        parts.push(format!("deregister: {}", e));
    }
    if let Some(e) = stop {
        parts.push(format!("stop: {}", e));
    }
    parts.join("; ")
}
