//! Request logging.

use axum::{extract::Request, http::Method, middleware::Next, response::Response};
use tracing::{debug, info, warn};

/// Log every request. Role changes are logged at info, everything else
/// (reads, CORS preflight) at debug.
pub async fn logging_middleware(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let start = std::time::Instant::now();

    let response = next.run(request).await;

    let duration = start.elapsed();
    let status = response.status();

    if !status.is_success() {
        warn!(%method, %uri, %status, ?duration, "Request failed");
    } else if is_role_change(&method) {
        info!(%method, %uri, %status, ?duration, "Role change completed");
    } else {
        debug!(%method, %uri, %status, ?duration, "Request completed");
    }

    response
}

/// Role changes are the only mutating routes.
fn is_role_change(method: &Method) -> bool {
    *method == Method::POST || *method == Method::DELETE
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_mutating_methods_are_role_changes() {
        assert!(is_role_change(&Method::POST));
        assert!(is_role_change(&Method::DELETE));

        for method in [Method::GET, Method::HEAD, Method::OPTIONS] {
            assert!(!is_role_change(&method));
        }
    }
}
