//! Proxy role coordination.
//!
//! A node either serves as a proxy for other peers or routes through
//! someone else's proxy, never both. Entering the serving role needs both the
//! directory registration and the local proxy to come up; leaving it always
//! succeeds locally even when the remote cleanup does not.

mod coordinator;
mod error;
mod ports;
mod types;

pub use coordinator::RoleCoordinator;
pub use error::RoleError;
pub use ports::{DirectoryService, LocalProxyControl};
pub use types::*;

pub use directory_client::{ProxyOffering, SelfOffering};
