use std::time::Instant;

use axum::{middleware::Next, response::Response};

/// Log every request with its method, path, status, and latency. Severity
/// follows the response class, so scraping for warnings surfaces rejected
/// calls without reading access logs.
pub async fn trace_requests(
    req: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Response {
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let started = Instant::now();

    let response = next.run(req).await;

    let status = response.status();
    let latency_ms = started.elapsed().as_millis() as u64;
    if status.is_server_error() {
        tracing::error!(%method, path, %status, latency_ms, "request failed");
    } else if status.is_client_error() {
        tracing::warn!(%method, path, %status, latency_ms, "request rejected");
    } else {
        tracing::info!(%method, path, %status, latency_ms, "request handled");
    }
    response
}
