//! API error mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use role_coordinator::RoleError;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum NodeError {
    #[error(transparent)]
    Role(#[from] RoleError),
}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

impl NodeError {
    fn classify(&self) -> (StatusCode, &'static str) {
        match self {
            NodeError::Role(e) => match e {
                RoleError::InvalidOffering(_) => (StatusCode::BAD_REQUEST, "INVALID_OFFERING"),
                RoleError::AlreadyActive => (StatusCode::CONFLICT, "ALREADY_ACTIVE"),
                RoleError::AlreadyConnected => (StatusCode::CONFLICT, "ALREADY_CONNECTED"),
                RoleError::OperationInProgress => (StatusCode::CONFLICT, "OPERATION_IN_PROGRESS"),
                RoleError::NotActive => (StatusCode::CONFLICT, "NOT_ACTIVE"),
                RoleError::RegistrationFailed(_) => (StatusCode::BAD_GATEWAY, "REGISTRATION_FAILED"),
                RoleError::StartFailed(_) => (StatusCode::BAD_GATEWAY, "START_FAILED"),
                RoleError::TeardownIncomplete { .. } => {
                    (StatusCode::BAD_GATEWAY, "TEARDOWN_INCOMPLETE")
                }
                RoleError::ReconcileFailed(_) => (StatusCode::BAD_GATEWAY, "RECONCILE_FAILED"),
                RoleError::Interrupted => (StatusCode::SERVICE_UNAVAILABLE, "INTERRUPTED"),
            },
        }
    }
}

impl IntoResponse for NodeError {
    fn into_response(self) -> Response {
        let (status, code) = self.classify();

        let body = ErrorResponse {
            error: self.to_string(),
            code: code.to_string(),
        };

        (status, Json(body)).into_response()
    }
}
