//! Proxy node - Entry point.

use anyhow::Context;
use directory_client::{DirectoryClient, DirectoryPoller};
use proxy_control_client::ProxyControlClient;
use proxy_node::{
    api::{create_router, AppState},
    config::Config,
    logging::init_logging,
};
use role_coordinator::RoleCoordinator;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{debug, error, info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config = Config::load().context("Failed to load configuration")?;

    // Initialize logging
    init_logging(&config.log);

    info!("Starting proxy node...");

    // Initialize clients
    let directory = DirectoryClient::new(&config.directory.base_url, config.directory.timeout)
        .context("Failed to create directory client")?;

    let control = ProxyControlClient::new(&config.control.base_url, config.control.timeout)
        .context("Failed to create proxy control client")?;

    if !directory.health_check().await {
        warn!(
            "Directory not reachable at {} - proxy list will stay empty until it is",
            directory.base_url()
        );
    }

    let coordinator = Arc::new(RoleCoordinator::from_clients(
        directory.clone(),
        control.clone(),
    ));

    if config.node.reconcile_on_startup {
        match coordinator.reconcile().await {
            Ok(true) => info!("Withdrew proxy registration left by a previous run"),
            Ok(false) => debug!("No stale proxy registration found"),
            Err(e) => warn!("Startup reconciliation skipped: {}", e),
        }
    }

    let poller = DirectoryPoller::start(directory.clone(), config.directory.poll_interval);

    let state = AppState::new(coordinator.clone(), directory, control);
    let app = create_router(state);

    let ip: IpAddr = config
        .server
        .listen_addr
        .parse()
        .with_context(|| format!("Invalid listen address {}", config.server.listen_addr))?;
    let addr = SocketAddr::new(ip, config.server.port);

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    info!("Listening on {}", addr);

    let served = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await;

    info!("Shutting down...");
    poller.stop().await;

    if config.node.release_on_shutdown && coordinator.current_state().is_serving() {
        match coordinator.end_serving().await {
            Ok(()) => info!("Stopped serving before exit"),
            Err(e) => error!("Could not cleanly stop serving: {}", e),
        }
    }

    served.context("Server error")
}

async fn shutdown_signal() {
    if let Err(e) = signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
