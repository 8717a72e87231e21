//! Observability for the triage server: structured logging and Prometheus metrics.

mod logging;
mod metrics;

pub use logging::{
    build_subscriber, init_logging, rotating_file, LogGuard, LoggingError, MAX_LOG_BYTES,
    MAX_LOG_FILES, SERVICE_NAME,
};
pub use metrics::{MetricsError, MetricsRegistry, RequestOutcome};
