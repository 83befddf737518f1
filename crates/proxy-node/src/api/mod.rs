//! HTTP API consumed by the desktop UI.

mod handlers;
mod middleware;
mod types;

pub use handlers::*;
pub use middleware::logging_middleware;
pub use types::*;

use axum::{
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use directory_client::DirectoryClient;
use proxy_control_client::ProxyControlClient;
use role_coordinator::RoleCoordinator;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Owner of the proxy role
    pub coordinator: Arc<RoleCoordinator>,
    /// Directory client, read for the cached proxy list
    pub directory: DirectoryClient,
    /// Local proxy controller, used for health reporting
    pub control: ProxyControlClient,
}

impl AppState {
    pub fn new(
        coordinator: Arc<RoleCoordinator>,
        directory: DirectoryClient,
        control: ProxyControlClient,
    ) -> Self {
        Self {
            coordinator,
            directory,
            control,
        }
    }
}

/// Create the API router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/v1/proxies", get(handlers::list_proxies))
        .route("/v1/role", get(handlers::get_role))
        .route(
            "/v1/role/serve",
            post(handlers::begin_serving).delete(handlers::end_serving),
        )
        .route(
            "/v1/role/connect",
            post(handlers::connect).delete(handlers::disconnect),
        )
        .layer(axum_middleware::from_fn(logging_middleware))
        .layer(TraceLayer::new_for_http())
        // The UI is served from its own origin.
        .layer(CorsLayer::permissive())
        .with_state(state)
}
