//! Process-wide structured logger.
//!
//! Two rotating JSON-line files (`combined.log` for every enabled level,
//! `error.log` for errors only) plus, outside production, a colorized console
//! sink. File writes are handed to background workers via `tracing-appender`.

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

use chrono::Local;
use file_rotate::compression::Compression;
use file_rotate::suffix::AppendCount;
use file_rotate::{ContentLimit, FileRotate};
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::field::{Field, Visit};
use tracing::{Event, Subscriber};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::{FmtContext, FormatEvent, FormatFields};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::{EnvFilter, Layer, Registry};
use triage_config::LogConfig;

/// Value of the `service` field on every record.
pub const SERVICE_NAME: &str = "triage-server";
/// Size at which a log file is rotated (5 MiB).
pub const MAX_LOG_BYTES: usize = 5 * 1024 * 1024;
/// Number of rotated siblings kept per file.
pub const MAX_LOG_FILES: usize = 5;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("failed to create log directory {path}: {source}")]
    CreateDir { path: PathBuf, source: io::Error },

    #[error("invalid log level {level:?}: {reason}")]
    InvalidLevel { level: String, reason: String },

    #[error("failed to install global subscriber: {0}")]
    Init(String),
}

/// Keeps the background log writers alive. Dropping it flushes pending records.
#[must_use = "dropping the guard stops the log writers"]
pub struct LogGuard {
    _guards: Vec<WorkerGuard>,
}

/// Opens `path` for appending, rotating at `max_bytes` and keeping `max_files` siblings.
pub fn rotating_file(path: &Path, max_bytes: usize, max_files: usize) -> FileRotate<AppendCount> {
    FileRotate::new(
        path,
        AppendCount::new(max_files),
        ContentLimit::Bytes(max_bytes),
        Compression::None,
        #[cfg(unix)]
        None,
    )
}

/// Builds the subscriber without installing it.
pub fn build_subscriber(
    config: &LogConfig,
) -> Result<(impl Subscriber + Send + Sync, LogGuard), LoggingError> {
    std::fs::create_dir_all(&config.dir).map_err(|source| LoggingError::CreateDir {
        path: config.dir.clone(),
        source,
    })?;

    let (combined, combined_guard) = tracing_appender::non_blocking(rotating_file(
        &config.dir.join("combined.log"),
        MAX_LOG_BYTES,
        MAX_LOG_FILES,
    ));
    let (errors, errors_guard) = tracing_appender::non_blocking(rotating_file(
        &config.dir.join("error.log"),
        MAX_LOG_BYTES,
        MAX_LOG_FILES,
    ));

    let mut layers: Vec<Box<dyn Layer<Registry> + Send + Sync>> = vec![
        tracing_subscriber::fmt::layer()
            .event_format(ServiceJson)
            .with_writer(combined)
            .with_ansi(false)
            .with_filter(level_filter(&config.level)?)
            .boxed(),
        tracing_subscriber::fmt::layer()
            .event_format(ServiceJson)
            .with_writer(errors)
            .with_ansi(false)
            .with_filter(LevelFilter::ERROR)
            .boxed(),
    ];

    if !config.environment.is_production() {
        layers.push(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_ansi(true)
                .compact()
                .with_filter(level_filter(&config.level)?)
                .boxed(),
        );
    }

    let subscriber = tracing_subscriber::registry().with(layers);
    let guard = LogGuard {
        _guards: vec![combined_guard, errors_guard],
    };
    Ok((subscriber, guard))
}

/// Builds the subscriber and installs it as the global default.
pub fn init_logging(config: &LogConfig) -> Result<LogGuard, LoggingError> {
    let (subscriber, guard) = build_subscriber(config)?;
    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| LoggingError::Init(e.to_string()))?;
    Ok(guard)
}

fn level_filter(level: &str) -> Result<EnvFilter, LoggingError> {
    EnvFilter::try_new(level).map_err(|e| LoggingError::InvalidLevel {
        level: level.to_string(),
        reason: e.to_string(),
    })
}

// ─────────────────────────────────────────────────────────────────────────────
// JSON record format
// ─────────────────────────────────────────────────────────────────────────────

/// One JSON object per line: timestamp, level, service, target, message, fields.
struct ServiceJson;

impl<S, N> FormatEvent<S, N> for ServiceJson
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        _ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        let meta = event.metadata();
        let mut visitor = FieldVisitor::default();
        event.record(&mut visitor);

        let mut record = Map::new();
        record.insert(
            "timestamp".into(),
            Local::now().format(TIMESTAMP_FORMAT).to_string().into(),
        );
        record.insert("level".into(), meta.level().as_str().to_lowercase().into());
        record.insert("service".into(), SERVICE_NAME.into());
        record.insert("target".into(), meta.target().into());
        record.insert("message".into(), visitor.message.unwrap_or_default().into());
        for (key, value) in visitor.fields {
            record.entry(key).or_insert(value);
        }

        let line = serde_json::to_string(&Value::Object(record)).map_err(|_| fmt::Error)?;
        writeln!(writer, "{}", line)
    }
}

#[derive(Default)]
struct FieldVisitor {
    message: Option<String>,
    fields: Map<String, Value>,
}

impl FieldVisitor {
    fn insert(&mut self, field: &Field, value: Value) {
        if field.name() == "message" {
            self.message = Some(match value {
                Value::String(s) => s,
                other => other.to_string(),
            });
            return;
        }
        self.fields.insert(field.name().to_string(), value);
    }
}

impl Visit for FieldVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        self.insert(field, value.into());
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.insert(field, value.into());
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.insert(field, value.into());
    }

    fn record_f64(&mut self, field: &Field, value: f64) {
        self.insert(field, value.into());
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.insert(field, value.into());
    }

    fn record_error(&mut self, field: &Field, value: &(dyn std::error::Error + 'static)) {
        self.insert(field, value.to_string().into());
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        self.insert(field, format!("{:?}", value).into());
    }
}
