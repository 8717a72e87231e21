//! Prometheus registry with process metrics and per-request HTTP metrics.

use std::time::{Duration, Instant};

use prometheus::{
    Encoder, Gauge, HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry, TextEncoder,
};
use thiserror::Error;

const REQUEST_LABELS: &[&str] = &["method", "route", "status_code"];
const DURATION_BUCKETS: &[f64] = &[0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0];

#[derive(Debug, Error)]
pub enum MetricsError {
    #[error("prometheus error: {0}")]
    Prometheus(#[from] prometheus::Error),

    #[error("metrics output is not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

/// Outcome of one HTTP request, as seen by the metrics middleware.
#[derive(Debug, Clone)]
pub struct RequestOutcome<'a> {
    pub method: &'a str,
    pub route: &'a str,
    pub status: u16,
    pub duration: Duration,
}

/// Owned metrics registry. Cloning shares the underlying collectors.
#[derive(Clone)]
pub struct MetricsRegistry {
    registry: Registry,
    started: Instant,
    uptime: Gauge,
    requests_total: IntCounterVec,
    request_duration: HistogramVec,
}

impl MetricsRegistry {
    pub fn new() -> Result<Self, MetricsError> {
        let registry = Registry::new();

        let uptime = Gauge::new(
            "process_uptime_seconds",
            "Seconds since the process started.",
        )?;
        registry.register(Box::new(uptime.clone()))?;

        #[cfg(target_os = "linux")]
        registry.register(Box::new(
            prometheus::process_collector::ProcessCollector::for_self(),
        ))?;

        let requests_total = IntCounterVec::new(
            Opts::new("http_requests_total", "Total number of HTTP requests."),
            REQUEST_LABELS,
        )?;
        registry.register(Box::new(requests_total.clone()))?;

        let request_duration = HistogramVec::new(
            HistogramOpts::new(
                "http_request_duration_seconds",
                "HTTP request latency in seconds.",
            )
            .buckets(DURATION_BUCKETS.to_vec()),
            REQUEST_LABELS,
        )?;
        registry.register(Box::new(request_duration.clone()))?;

        Ok(Self {
            registry,
            started: Instant::now(),
            uptime,
            requests_total,
            request_duration,
        })
    }

    /// Records a completed request.
    pub fn observe(&self, outcome: &RequestOutcome<'_>) {
        let status = outcome.status.to_string();
        let labels = [outcome.method, outcome.route, status.as_str()];
        self.requests_total.with_label_values(&labels).inc();
        self.request_duration
            .with_label_values(&labels)
            .observe(outcome.duration.as_secs_f64());
    }

    /// Content type of [`MetricsRegistry::gather`] output.
    pub fn content_type(&self) -> String {
        TextEncoder::new().format_type().to_string()
    }

    /// Serializes the current snapshot in the Prometheus text format.
    pub fn gather(&self) -> Result<String, MetricsError> {
        self.uptime.set(self.started.elapsed().as_secs_f64());

        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }
}
