//! Request middleware: access logging and Prometheus metrics.

pub mod access_log;
pub mod metrics;

pub use access_log::AccessLog;
