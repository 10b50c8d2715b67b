use axum::body::Body;
use axum::extract::MatchedPath;
use axum::http::Request;
use axum::middleware::Next;
use axum::response::Response;
use metrics::{counter, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::time::Instant;

/// Record request count and latency per method, route and status.
///
/// Unmatched requests (the proxy fallback) are labelled with their first two
/// path segments so the label set stays bounded.
pub async fn metrics_middleware(
    matched_path: Option<MatchedPath>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let start = Instant::now();
    let method = req.method().to_string();
    let path = matched_path
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| route_label(req.uri().path()));

    let response = next.run(req).await;

    let duration = start.elapsed().as_secs_f64();
    let status = response.status().as_u16().to_string();

    let labels = [("method", method), ("path", path), ("status", status)];

    counter!("http_requests_total", &labels).increment(1);
    histogram!("http_request_duration_seconds", &labels).record(duration);

    response
}

fn route_label(path: &str) -> String {
    let mut segments = path.split('/').filter(|s| !s.is_empty()).take(2);
    match (segments.next(), segments.next()) {
        (Some(a), Some(b)) => format!("/{a}/{b}/*"),
        (Some(a), None) => format!("/{a}"),
        _ => "/".to_string(),
    }
}

/// Install the global Prometheus recorder.
pub fn init_metrics() -> anyhow::Result<PrometheusHandle> {
    Ok(PrometheusBuilder::new().install_recorder()?)
}

/// A handle that renders an empty, unregistered recorder. Lets routers be
/// built repeatedly (tests) without touching the global recorder.
pub fn detached_metrics() -> PrometheusHandle {
    PrometheusBuilder::new().build_recorder().handle()
}
