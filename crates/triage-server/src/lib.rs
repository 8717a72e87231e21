//! HTTP surface of the triage incident assistant.
//!
//! Routes:
//!
//! - `GET /health` — liveness probe
//! - `POST /completion` — forward a prompt to the agent
//! - `GET /history` — prompts accepted since startup
//! - `GET /metrics` — Prometheus scrape endpoint

pub mod dto;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod services;
pub mod state;

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, Response};
use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;
use tracing::info;

pub use middleware::AccessLog;
pub use state::ServerState;

/// Builds the application router.
///
/// Layer order, outermost first: request span, access log, metrics, handler.
pub fn build_router(state: Arc<ServerState>, access_log: AccessLog) -> Router {
    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(|req: &Request<Body>| {
            tracing::info_span!(
                "request",
                method = %req.method(),
                uri = %req.uri(),
                version = ?req.version(),
            )
        })
        .on_response(|res: &Response<Body>, latency: Duration, _span: &tracing::Span| {
            info!(
                latency = %format!("{} ms", latency.as_millis()),
                status = %res.status().as_u16(),
                "finished processing request"
            );
        });

    Router::new()
        .route("/health", get(handlers::health))
        .route("/completion", post(handlers::completion::create))
        .route("/history", get(handlers::history::list))
        .route("/metrics", get(handlers::metrics::scrape))
        .with_state(state.clone())
        .layer(axum::middleware::from_fn_with_state(
            state.metrics.clone(),
            middleware::metrics::track,
        ))
        .layer(axum::middleware::from_fn_with_state(
            access_log,
            middleware::access_log::log_request,
        ))
        .layer(trace_layer)
}

#[cfg(test)]
mod tests;
