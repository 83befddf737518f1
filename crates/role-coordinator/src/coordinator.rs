//! Proxy role coordinator.

use crate::error::RoleError;
use crate::ports::{DirectoryService, LocalProxyControl};
use crate::types::{PendingOperation, RoleState, RoleStatus};
use chrono::Utc;
use directory_client::{DirectoryClient, ProxyOffering, SelfOffering};
use proxy_control_client::ProxyControlClient;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::{watch, Mutex, MutexGuard};
use tracing::{info, instrument, warn, Instrument};

/// Single owner of the node's proxy role.
///
/// Role changes are serialized: a change requested while another is in
/// flight fails with [`RoleError::OperationInProgress`] instead of waiting.
/// Reads go through a watch channel and never wait on the transition lock.
///
/// Each role change runs on its own task. Dropping the returned future does
/// not stop a change halfway; it still commits or compensates.
#[derive(Clone)]
pub struct RoleCoordinator {
    inner: Arc<Inner>,
}

struct Inner {
    directory: Arc<dyn DirectoryService>,
    control: Arc<dyn LocalProxyControl>,
    status: watch::Sender<RoleStatus>,
    transition: Mutex<()>,
}

/// Held for the duration of one role change.
struct Transition<'a> {
    _guard: MutexGuard<'a, ()>,
    status: &'a watch::Sender<RoleStatus>,
}

impl Transition<'_> {
    fn phase(&self, pending: PendingOperation) {
        self.status.send_modify(|s| s.pending = pending);
    }
}

impl Drop for Transition<'_> {
    fn drop(&mut self) {
        self.status.send_modify(|s| s.pending = PendingOperation::None);
    }
}

impl RoleCoordinator {
    /// Create an idle coordinator.
    pub fn new(directory: Arc<dyn DirectoryService>, control: Arc<dyn LocalProxyControl>) -> Self {
        let (status, _) = watch::channel(RoleStatus::default());

        Self {
            inner: Arc::new(Inner {
                directory,
                control,
                status,
                transition: Mutex::new(()),
            }),
        }
    }

    /// Create a coordinator over the HTTP clients.
    pub fn from_clients(directory: DirectoryClient, control: ProxyControlClient) -> Self {
        Self::new(Arc::new(directory), Arc::new(control))
    }

    pub fn current_state(&self) -> RoleState {
        self.inner.status.borrow().state.clone()
    }

    pub fn status(&self) -> RoleStatus {
        self.inner.status.borrow().clone()
    }

    pub fn pending(&self) -> PendingOperation {
        self.inner.status.borrow().pending
    }

    /// Receiver notified on every state, phase or warning change.
    pub fn subscribe(&self) -> watch::Receiver<RoleStatus> {
        self.inner.status.subscribe()
    }

    /// Register with the directory, then start the local proxy.
    ///
    /// If the proxy fails to start the registration is withdrawn again. The
    /// state only leaves `Idle` once both steps succeeded.
    #[instrument(skip(self, offering), fields(name = %offering.name))]
    pub async fn begin_serving(&self, offering: SelfOffering) -> Result<(), RoleError> {
        let inner = self.inner.clone();
        detached(async move { inner.begin_serving(offering).await }).await
    }

    /// Deregister and stop the local proxy.
    ///
    /// The node is idle afterwards whatever the remote calls returned; their
    /// failures come back as [`RoleError::TeardownIncomplete`].
    #[instrument(skip(self))]
    pub async fn end_serving(&self) -> Result<(), RoleError> {
        let inner = self.inner.clone();
        detached(async move { inner.end_serving().await }).await
    }

    /// Route through `offering`. Leaves the serving role first if needed.
    ///
    /// Connecting itself is local; no remote calls are made unless the node
    /// was serving.
    #[instrument(skip(self, offering), fields(proxy = %offering.name))]
    pub async fn connect(&self, offering: ProxyOffering) -> Result<(), RoleError> {
        let inner = self.inner.clone();
        detached(async move { inner.connect(offering).await }).await
    }

    #[instrument(skip(self))]
    pub async fn disconnect(&self) -> Result<(), RoleError> {
        let inner = self.inner.clone();
        detached(async move { inner.disconnect() }).await
    }

    /// Withdraw a registration left behind by a previous process.
    ///
    /// Only acts while idle. Returns whether anything was cleaned up.
    #[instrument(skip(self))]
    pub async fn reconcile(&self) -> Result<bool, RoleError> {
        let inner = self.inner.clone();
        detached(async move { inner.reconcile().await }).await
    }
}

/// Run a role change to completion on its own task.
async fn detached<T, F>(change: F) -> Result<T, RoleError>
where
    T: Send + 'static,
    F: Future<Output = Result<T, RoleError>> + Send + 'static,
{
    match tokio::spawn(change.in_current_span()).await {
        Ok(result) => result,
        Err(e) if e.is_panic() => std::panic::resume_unwind(e.into_panic()),
        Err(e) => {
            warn!("Role change task cancelled: {}", e);
            Err(RoleError::Interrupted)
        }
    }
}

impl Inner {
    async fn begin_serving(&self, offering: SelfOffering) -> Result<(), RoleError> {
        let transition = self.lock()?;

        if !self.current_state().is_idle() {
            return Err(RoleError::AlreadyActive);
        }
        offering.validate().map_err(RoleError::InvalidOffering)?;

        transition.phase(PendingOperation::Registering);
        if let Err(e) = self.directory.register(&offering).await {
            warn!("Registration failed, staying idle: {}", e);
            return Err(RoleError::RegistrationFailed(e));
        }

        transition.phase(PendingOperation::Starting);
        if let Err(e) = self.control.start_serving().await {
            warn!("Local proxy failed to start, withdrawing registration: {}", e);
            transition.phase(PendingOperation::Deregistering);
            if let Err(undo) = self.directory.deregister().await {
                warn!("Compensating deregister failed: {}", undo);
            }
            return Err(RoleError::StartFailed(e));
        }

        self.set_warning(None);
        self.commit(RoleState::Serving(offering));
        info!("Now serving as a proxy");
        Ok(())
    }

    async fn end_serving(&self) -> Result<(), RoleError> {
        let transition = self.lock()?;

        if !self.current_state().is_serving() {
            return Err(RoleError::NotActive);
        }

        self.teardown(&transition).await
    }

    async fn connect(&self, offering: ProxyOffering) -> Result<(), RoleError> {
        let transition = self.lock()?;

        match self.current_state() {
            RoleState::Connected(_) => return Err(RoleError::AlreadyConnected),
            RoleState::Serving(_) => {
                info!("Leaving serving role to connect");
                if let Err(e) = self.teardown(&transition).await {
                    warn!("Switching role despite incomplete teardown: {}", e);
                }
            }
            RoleState::Idle => {}
        }

        transition.phase(PendingOperation::Connecting);
        info!("Connected through {}", offering.endpoint());
        self.commit(RoleState::Connected(offering));
        Ok(())
    }

    fn disconnect(&self) -> Result<(), RoleError> {
        let transition = self.lock()?;

        if !self.current_state().is_connected() {
            return Err(RoleError::NotActive);
        }

        transition.phase(PendingOperation::Disconnecting);
        self.commit(RoleState::Idle);
        info!("Disconnected from proxy");
        Ok(())
    }

    async fn reconcile(&self) -> Result<bool, RoleError> {
        let transition = self.lock()?;

        if !self.current_state().is_idle() {
            return Ok(false);
        }

        let registered = self
            .directory
            .is_registered()
            .await
            .map_err(RoleError::ReconcileFailed)?;
        if !registered {
            return Ok(false);
        }

        warn!("Directory still lists this node as a proxy, withdrawing stale registration");
        transition.phase(PendingOperation::Deregistering);
        self.directory
            .deregister()
            .await
            .map_err(RoleError::ReconcileFailed)?;

        transition.phase(PendingOperation::Stopping);
        if let Err(e) = self.control.stop_serving().await {
            warn!("Could not stop leftover local proxy: {}", e);
        }

        Ok(true)
    }

    fn current_state(&self) -> RoleState {
        self.status.borrow().state.clone()
    }

    fn lock(&self) -> Result<Transition<'_>, RoleError> {
        let guard = self
            .transition
            .try_lock()
            .map_err(|_| RoleError::OperationInProgress)?;

        Ok(Transition {
            _guard: guard,
            status: &self.status,
        })
    }

    async fn teardown(&self, transition: &Transition<'_>) -> Result<(), RoleError> {
        transition.phase(PendingOperation::Deregistering);
        let deregister = self.directory.deregister().await.err();

        transition.phase(PendingOperation::Stopping);
        let stop = self.control.stop_serving().await.err();

        self.commit(RoleState::Idle);

        if deregister.is_none() && stop.is_none() {
            self.set_warning(None);
            info!("Stopped serving as a proxy");
            return Ok(());
        }

        let err = RoleError::TeardownIncomplete { deregister, stop };
        warn!("{}", err);
        self.set_warning(Some(err.to_string()));
        Err(err)
    }

    fn commit(&self, state: RoleState) {
        self.status.send_modify(|s| {
            s.state = state;
            s.since = Utc::now();
        });
    }

    fn set_warning(&self, warning: Option<String>) {
        self.status.send_modify(|s| s.warning = warning);
    }
}
