//! Liveness and readiness probes.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

use crate::AppState;

const CHECK_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Unhealthy,
}

impl HealthStatus {
    pub fn http_status(&self) -> StatusCode {
        match self {
            HealthStatus::Healthy => StatusCode::OK,
            HealthStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadinessReport {
    pub status: HealthStatus,
    /// Metadata store round-trip.
    pub latency_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub version: String,
    pub timestamp: DateTime<Utc>,
}

impl IntoResponse for ReadinessReport {
    fn into_response(self) -> Response {
        (self.status.http_status(), Json(self)).into_response()
    }
}

/// GET /health
pub async fn health() -> &'static str {
    "OK"
}

/// GET /ready: 503 unless the dataset store answers in time.
pub async fn ready(State(state): State<AppState>) -> ReadinessReport {
    let started = Instant::now();
    let outcome = tokio::time::timeout(CHECK_TIMEOUT, state.datasets.ping()).await;
    let latency_ms = started.elapsed().as_millis() as u64;

    let (status, error) = match outcome {
        Ok(Ok(())) => (HealthStatus::Healthy, None),
        Ok(Err(err)) => (HealthStatus::Unhealthy, Some(err.to_string())),
        Err(_) => (
            HealthStatus::Unhealthy,
            Some(format!("Check timed out after {:?}", CHECK_TIMEOUT)),
        ),
    };

    if let Some(ref err) = error {
        tracing::warn!(error = %err, "Readiness check failed");
    }

    ReadinessReport {
        status,
        latency_ms,
        error,
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: Utc::now(),
    }
}
