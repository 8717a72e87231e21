//! Common Log Format access log.
//!
//! One line per request is appended to `access.log`. Lines are handed to a
//! background writer, so the response never waits on the disk. The file is not
//! rotated.

use std::fs::OpenOptions;
use std::io::{self, Write};
use std::net::SocketAddr;
use std::path::Path;

use axum::body::HttpBody;
use axum::extract::{ConnectInfo, Request, State};
use axum::http::header;
use axum::middleware::Next;
use axum::response::Response;
use chrono::{DateTime, Utc};
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};

const CLF_DATE_FORMAT: &str = "%d/%b/%Y:%H:%M:%S %z";

/// Cheaply clonable handle to the access log writer.
#[derive(Clone)]
pub struct AccessLog {
    writer: NonBlocking,
}

impl AccessLog {
    /// Opens `dir/access.log` in append mode.
    pub fn open(dir: &Path) -> io::Result<(Self, WorkerGuard)> {
        std::fs::create_dir_all(dir)?;
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(dir.join("access.log"))?;
        Ok(Self::from_writer(file))
    }

    pub fn from_writer<W: Write + Send + 'static>(writer: W) -> (Self, WorkerGuard) {
        let (writer, guard) = tracing_appender::non_blocking(writer);
        (Self { writer }, guard)
    }

    fn write_line(&self, line: &str) {
        let mut writer = self.writer.clone();
        if let Err(e) = writer.write_all(line.as_bytes()) {
            tracing::warn!("Failed to queue access log line: {}", e);
        }
    }
}

/// Fields of a single access log line.
struct AccessRecord {
    remote_addr: Option<SocketAddr>,
    time: DateTime<Utc>,
    request_line: String,
    status: u16,
    content_length: Option<u64>,
}

impl AccessRecord {
    fn format(&self) -> String {
        let remote = self
            .remote_addr
            .map(|addr| addr.ip().to_string())
            .unwrap_or_else(|| "-".into());
        let length = self
            .content_length
            .map(|len| len.to_string())
            .unwrap_or_else(|| "-".into());

        format!(
            "{} - - [{}] \"{}\" {} {}\n",
            remote,
            self.time.format(CLF_DATE_FORMAT),
            self.request_line,
            self.status,
            length
        )
    }
}

/// Middleware writing one line per request after the response is produced.
pub async fn log_request(State(log): State<AccessLog>, req: Request, next: Next) -> Response {
    let time = Utc::now();
    let remote_addr = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);
    let request_line = format!("{} {} {:?}", req.method(), req.uri(), req.version());

    let response = next.run(req).await;

    let content_length = response.body().size_hint().exact().or_else(|| {
        response
            .headers()
            .get(header::CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse().ok())
    });

    let record = AccessRecord {
        remote_addr,
        time,
        request_line,
        status: response.status().as_u16(),
        content_length,
    };
    log.write_line(&record.format());

    response
}
