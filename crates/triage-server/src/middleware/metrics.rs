use std::time::Instant;

use axum::extract::{MatchedPath, Request, State};
use axum::middleware::Next;
use axum::response::Response;
use triage_monitor::{MetricsRegistry, RequestOutcome};

/// Route label for requests that matched no route.
const UNMATCHED_ROUTE: &str = "unmatched";

/// Records method, route template, status and latency of every request.
pub async fn track(State(metrics): State<MetricsRegistry>, req: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = req.method().clone();
    let route = req
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_owned())
        .unwrap_or_else(|| UNMATCHED_ROUTE.to_owned());

    let response = next.run(req).await;

    metrics.observe(&RequestOutcome {
        method: method.as_str(),
        route: &route,
        status: response.status().as_u16(),
        duration: start.elapsed(),
    });

    response
}
