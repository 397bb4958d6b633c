//! Logging, Prometheus metrics and health probes.

pub mod health;
pub mod logging;
pub mod metrics;

pub use health::{health, ready};
pub use logging::{init_logging, request_logging_middleware, LogConfig, LogFormat, REQUEST_ID_HEADER};
pub use metrics::{init_metrics, metrics_handler, DexaMetrics, MetricsError};
