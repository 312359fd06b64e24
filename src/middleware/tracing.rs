use axum::{
    extract::{MatchedPath, Request},
    middleware::Next,
    response::Response,
};
use std::time::Instant;
use tracing::{info_span, Instrument};

/// Per-request observability: a structured span carrying method, matched
/// route and a request id, plus a latency/status line on completion.
pub async fn observability_middleware(
    matched_path: Option<MatchedPath>,
    request: Request,
    next: Next,
) -> Response {
    let method = request.method().clone();
    let route = matched_path
        .as_ref()
        .map(|path| path.as_str())
        .unwrap_or("unknown")
        .to_string();
    let start_time = Instant::now();

    let span = info_span!(
        "http_request",
        method = %method,
        route = %route,
        request_id = %uuid::Uuid::now_v7(),
    );

    let response = next.run(request).instrument(span).await;

    let latency_ms = start_time.elapsed().as_millis();
    let status = response.status().as_u16();

    if status >= 500 {
        tracing::error!(%method, %route, status, latency_ms, "request failed");
    } else {
        tracing::info!(%method, %route, status, latency_ms, "request completed");
    }

    response
}
