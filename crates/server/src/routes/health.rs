//! Liveness and readiness probes.

use axum::{extract::State, http::StatusCode};

use crate::state::AppState;

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
pub async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Pings the credential store before returning OK.
/// Returns 503 Service Unavailable if the store is not reachable.
pub async fn readiness(State(state): State<AppState>) -> StatusCode {
    match state.authenticator().store().ping().await {
        Ok(()) => StatusCode::OK,
        Err(e) => {
            tracing::warn!(error = %e, "Readiness check failed");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::{body::Body, http::Request};
    use tower::ServiceExt;

    use super::*;
    use crate::routes::testing::TestApp;

    async fn get_status(app: &TestApp, uri: &str) -> StatusCode {
        app.router()
            .oneshot(Request::get(uri).body(Body::empty()).unwrap())
            .await
            .unwrap()
            .status()
    }

    #[tokio::test]
    async fn test_health_and_readiness() {
        let app = TestApp::with_user("first@gmail.com", "password").await;
        assert_eq!(get_status(&app, "/health").await, StatusCode::OK);
        assert_eq!(get_status(&app, "/health/ready").await, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_readiness_fails_when_store_is_down() {
        let app = TestApp::unreachable();
        assert_eq!(get_status(&app, "/health").await, StatusCode::OK);
        assert_eq!(
            get_status(&app, "/health/ready").await,
            StatusCode::SERVICE_UNAVAILABLE
        );
    }
}
