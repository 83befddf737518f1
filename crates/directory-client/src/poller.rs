//! Periodic directory refresh.

use crate::client::DirectoryClient;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};

/// Background task keeping the directory snapshot fresh.
///
/// Refresh failures leave the previous snapshot in place and never end the
/// loop. The task stops on [`DirectoryPoller::stop`] or when the poller is
/// dropped.
pub struct DirectoryPoller {
    shutdown: watch::Sender<bool>,
    task: Option<JoinHandle<()>>,
}

impl DirectoryPoller {
    /// Start polling `client` every `period`. The first refresh runs
    /// immediately.
    pub fn start(client: DirectoryClient, period: Duration) -> Self {
        let (shutdown, shutdown_rx) = watch::channel(false);
        let task = tokio::spawn(poll_loop(client, period, shutdown_rx));

        info!("Directory poller started (interval={:?})", period);

        Self {
            shutdown,
            task: Some(task),
        }
    }

    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|t| !t.is_finished())
    }

    /// Stop polling and wait for the task to exit.
    ///
    /// A refresh in flight is abandoned before it writes, so the snapshot is
    /// either fully replaced or untouched.
    pub async fn stop(mut self) {
        let _ = self.shutdown.send(true);
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                warn!("Directory poller task ended abnormally: {}", e);
            }
        }
        info!("Directory poller stopped");
    }
}

impl Drop for DirectoryPoller {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

async fn poll_loop(client: DirectoryClient, period: Duration, mut shutdown: watch::Receiver<bool>) {
    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = shutdown.changed() => break,
            _ = ticker.tick() => {}
        }

        tokio::select! {
            _ = shutdown.changed() => break,
            listing = client.list_offerings() => {
                if listing.is_stale() {
                    debug!("Serving stale directory snapshot ({} offerings)", listing.snapshot.len());
                } else {
                    debug!("Directory snapshot refreshed ({} offerings)", listing.snapshot.len());
                }
            }
        }
    }
}
