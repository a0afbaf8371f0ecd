use std::time::Duration;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use tokio::time::timeout;

use super::data_source::*;

const READINESS_TIMEOUT: Duration = Duration::from_secs(10);

/// Ready while the service is not draining and the database answers a ping.
#[tracing::instrument]
pub async fn handler(data_src: StateDataSource) -> Response {
    match timeout(READINESS_TIMEOUT, data_src.is_ready()).await {
        Ok(Ok(())) => {
            let msg = serde_json::json!({"status": "ok"});
            (StatusCode::OK, Json(msg)).into_response()
        }
        Ok(Err(e)) => {
            tracing::debug!(error = %e, "readiness check failed");
            unavailable(readiness_message(&e))
        }
        Err(_) => unavailable("health check timed out"),
    }
}

fn readiness_message(err: &DataSourceError) -> &'static str {
    match err {
        DataSourceError::DependencyFailure => "database is not available",
        DataSourceError::ShuttingDown => "service is shutting down",
    }
}

fn unavailable(message: &str) -> Response {
    let msg = serde_json::json!({"status": "failure", "message": message});
    (StatusCode::SERVICE_UNAVAILABLE, Json(msg)).into_response()
}
