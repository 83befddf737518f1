//! HTTP request handlers.

use super::types::{HealthResponse, ProxiesResponse};
use super::AppState;
use crate::error::NodeError;
use axum::{extract::State, Json};
use directory_client::{ProxyOffering, SelfOffering};
use role_coordinator::{RoleError, RoleStatus};
use tracing::{info, warn};

/// Health check endpoint.
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let (directory_healthy, control_healthy) = tokio::join!(
        state.directory.health_check(),
        state.control.health_check()
    );

    Json(HealthResponse {
        status: "ok".to_string(),
        directory_healthy,
        control_healthy,
    })
}

/// Proxies other peers currently offer, from the polled snapshot.
pub async fn list_proxies(State(state): State<AppState>) -> Json<ProxiesResponse> {
    let snapshot = state.directory.snapshot();

    Json(ProxiesResponse {
        offerings: snapshot.offerings.as_ref().clone(),
        total: snapshot.len(),
        refreshed_at: snapshot.refreshed_at,
    })
}

pub async fn get_role(State(state): State<AppState>) -> Json<RoleStatus> {
    Json(state.coordinator.status())
}

/// Start serving as a proxy for other peers.
pub async fn begin_serving(
    State(state): State<AppState>,
    Json(offering): Json<SelfOffering>,
) -> Result<Json<RoleStatus>, NodeError> {
    info!(name = %offering.name, "Serve request received");
    state.coordinator.begin_serving(offering).await?;
    Ok(Json(state.coordinator.status()))
}

/// Stop serving. Incomplete remote cleanup still answers with the (idle)
/// status; its `warning` carries the details.
pub async fn end_serving(State(state): State<AppState>) -> Result<Json<RoleStatus>, NodeError> {
    match state.coordinator.end_serving().await {
        Ok(()) => {}
        Err(e @ RoleError::TeardownIncomplete { .. }) => {
            warn!("Stopped serving with remote bookkeeping possibly inconsistent: {}", e);
        }
        Err(e) => return Err(e.into()),
    }
    Ok(Json(state.coordinator.status()))
}

/// Route through another peer's proxy.
pub async fn connect(
    State(state): State<AppState>,
    Json(offering): Json<ProxyOffering>,
) -> Result<Json<RoleStatus>, NodeError> {
    info!(proxy = %offering.name, endpoint = %offering.endpoint(), "Connect request received");
    state.coordinator.connect(offering).await?;
    Ok(Json(state.coordinator.status()))
}

pub async fn disconnect(State(state): State<AppState>) -> Result<Json<RoleStatus>, NodeError> {
    state.coordinator.disconnect().await?;
    Ok(Json(state.coordinator.status()))
}
