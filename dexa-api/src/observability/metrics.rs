//! Prometheus metrics for uploads, model calls and chat traffic.
//!
//! Call [`init_metrics`] once at startup and mount [`metrics_handler`] at
//! `/metrics`. Recording before initialization is a no-op.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use metrics::{counter, describe_counter, describe_histogram, histogram, Unit};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use std::{sync::OnceLock, time::Duration};
use tracing::error;

static PROMETHEUS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Installs the global Prometheus recorder. Later calls are no-ops.
pub fn init_metrics() -> Result<(), MetricsError> {
    if PROMETHEUS_HANDLE.get().is_some() {
        return Ok(());
    }

    let handle = PrometheusBuilder::new()
        .set_buckets_for_metric(
            Matcher::Full("dexa_llm_request_duration_seconds".to_string()),
            &[0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 20.0, 30.0, 60.0, 120.0],
        )
        .map_err(|e| MetricsError::Installation(e.to_string()))?
        .set_buckets_for_metric(
            Matcher::Full("dexa_upload_size_bytes".to_string()),
            &[
                1_000.0, 10_000.0, 100_000.0, 1_000_000.0, 10_000_000.0, 50_000_000.0,
            ],
        )
        .map_err(|e| MetricsError::Installation(e.to_string()))?
        .install_recorder()
        .map_err(|e| MetricsError::Installation(e.to_string()))?;

    PROMETHEUS_HANDLE
        .set(handle)
        .map_err(|_| MetricsError::Installation("Handle already set".to_string()))?;

    register_metric_descriptions();

    Ok(())
}

fn register_metric_descriptions() {
    describe_counter!(
        "dexa_uploads_total",
        Unit::Count,
        "Datasets uploaded, by file type"
    );
    describe_histogram!(
        "dexa_upload_size_bytes",
        Unit::Bytes,
        "Size of uploaded dataset files"
    );
    describe_counter!(
        "dexa_llm_requests_total",
        Unit::Count,
        "Completion API calls, by outcome"
    );
    describe_histogram!(
        "dexa_llm_request_duration_seconds",
        Unit::Seconds,
        "Completion API round-trip time"
    );
    describe_counter!(
        "dexa_messages_total",
        Unit::Count,
        "Chat messages stored, by role"
    );
}

#[derive(Debug, thiserror::Error)]
pub enum MetricsError {
    #[error("Failed to install metrics exporter: {0}")]
    Installation(String),
}

/// Prometheus text exposition.
pub async fn metrics_handler() -> Response {
    match PROMETHEUS_HANDLE.get() {
        Some(handle) => (
            StatusCode::OK,
            [("content-type", "text/plain; version=0.0.4")],
            handle.render(),
        )
            .into_response(),
        None => {
            error!("Metrics handler called but metrics not initialized");
            (StatusCode::INTERNAL_SERVER_ERROR, "Metrics not initialized").into_response()
        }
    }
}

/// Domain counters and histograms.
pub struct DexaMetrics;

impl DexaMetrics {
    pub fn dataset_uploaded(file_type: &str, size_bytes: i64) {
        counter!("dexa_uploads_total", "file_type" => file_type.to_string()).increment(1);
        histogram!("dexa_upload_size_bytes").record(size_bytes.max(0) as f64);
    }

    /// `outcome` is `success` or `error`.
    pub fn llm_request(outcome: &'static str, duration: Duration) {
        counter!("dexa_llm_requests_total", "outcome" => outcome).increment(1);
        histogram!("dexa_llm_request_duration_seconds").record(duration.as_secs_f64());
    }

    pub fn message_stored(role: &'static str) {
        counter!("dexa_messages_total", "role" => role).increment(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    #[tokio::test]
    async fn test_metrics_endpoint_renders_recorded_metrics() {
        init_metrics().unwrap();
        init_metrics().unwrap();

        DexaMetrics::dataset_uploaded("csv", 128);
        DexaMetrics::llm_request("success", Duration::from_millis(420));
        DexaMetrics::message_stored("user");

        let response = metrics_handler().await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = response.into_body().collect().await.unwrap().to_bytes();
        let text = String::from_utf8(body.to_vec()).unwrap();
        assert!(text.contains("dexa_uploads_total{file_type=\"csv\"}"));
        assert!(text.contains("dexa_llm_requests_total{outcome=\"success\"}"));
        assert!(text.contains("dexa_messages_total{role=\"user\"}"));
        assert!(text.contains("dexa_llm_request_duration_seconds_bucket"));
    }
}
