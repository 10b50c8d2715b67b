use std::sync::Arc;

use axum::body::Body;
use axum::extract::{Request, State};
use axum::http::{HeaderMap, HeaderName};
use axum::response::Response;
use axum::Extension;

use tollgate_shared::{strip_identity_headers, AppError, AppResult, AuthenticatedIdentity, ErrorCode};

use crate::AppState;

pub const ROUTE_NOT_FOUND_MESSAGE: &str = "Route not found";

/// Headers that describe a single connection and are never forwarded.
/// `content-length` is recomputed from the buffered body.
const HOP_BY_HOP_HEADERS: &[&str] = &[
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailer",
    "trailers",
    "transfer-encoding",
    "upgrade",
    "host",
    "content-length",
];

fn is_hop_by_hop(name: &HeaderName) -> bool {
    HOP_BY_HOP_HEADERS.contains(&name.as_str())
}

fn forwardable(headers: &HeaderMap) -> HeaderMap {
    let mut out = HeaderMap::with_capacity(headers.len());
    for (name, value) in headers {
        if !is_hop_by_hop(name) {
            out.append(name.clone(), value.clone());
        }
    }
    out
}

/// Catch-all handler that forwards to the backend owning the path prefix.
///
/// Identity headers reaching the backend come only from the
/// [`AuthenticatedIdentity`] the auth middleware attached. Connection
/// failures, timeouts and unreadable upstream bodies all answer 503.
pub async fn proxy_handler(
    State(state): State<Arc<AppState>>,
    identity: Option<Extension<AuthenticatedIdentity>>,
    req: Request,
) -> AppResult<Response> {
    let (parts, body) = req.into_parts();
    let path = parts.uri.path();

    let route = state
        .routes
        .resolve(path)
        .ok_or_else(|| AppError::not_found(ROUTE_NOT_FOUND_MESSAGE))?;
    let upstream_url = route
        .upstream_url(path, parts.uri.query())
        .ok_or_else(|| AppError::not_found(ROUTE_NOT_FOUND_MESSAGE))?;

    let body_bytes = axum::body::to_bytes(body, state.config.max_body_bytes)
        .await
        .map_err(|_| {
            AppError::new(
                ErrorCode::PayloadTooLarge,
                format!("Request body exceeds {} bytes", state.config.max_body_bytes),
            )
        })?;

    let mut headers = forwardable(&parts.headers);
    strip_identity_headers(&mut headers);
    if let Some(Extension(identity)) = &identity {
        identity.write_headers(&mut headers);
    }

    tracing::debug!(
        method = %parts.method,
        path = %path,
        upstream = %route.name,
        user_id = ?identity.as_ref().map(|Extension(i)| i.user_id),
        "proxying request"
    );

    let mut upstream_req = state
        .http_client
        .request(parts.method.clone(), &upstream_url)
        .headers(headers);
    if !body_bytes.is_empty() {
        upstream_req = upstream_req.body(body_bytes);
    }

    let upstream_resp = upstream_req.send().await.map_err(|e| {
        upstream_failure(route.name, &upstream_url, &e)
    })?;

    let status = upstream_resp.status();
    let response_headers = forwardable(upstream_resp.headers());
    let resp_body = upstream_resp
        .bytes()
        .await
        .map_err(|e| upstream_failure(route.name, &upstream_url, &e))?;

    tracing::debug!(upstream = %route.name, status = status.as_u16(), "upstream responded");

    let mut response = Response::new(Body::from(resp_body));
    *response.status_mut() = status;
    *response.headers_mut() = response_headers;
    Ok(response)
}

fn upstream_failure(service: &'static str, url: &str, err: &reqwest::Error) -> AppError {
    tracing::error!(upstream = %url, error = %err, timeout = err.is_timeout(), "upstream request failed");
    metrics::counter!("gateway_upstream_failures_total", "service" => service).increment(1);
    AppError::upstream_unavailable()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn hop_by_hop_headers_are_dropped() {
        let mut headers = HeaderMap::new();
        headers.insert("connection", HeaderValue::from_static("keep-alive"));
        headers.insert("host", HeaderValue::from_static("gateway.local"));
        headers.insert("content-length", HeaderValue::from_static("12"));
        headers.insert("content-type", HeaderValue::from_static("application/json"));
        headers.append("set-cookie", HeaderValue::from_static("a=1"));
        headers.append("set-cookie", HeaderValue::from_static("b=2"));

        let out = forwardable(&headers);
        assert!(out.get("connection").is_none());
        assert!(out.get("host").is_none());
        assert!(out.get("content-length").is_none());
        assert_eq!(out.get("content-type").unwrap(), "application/json");
        assert_eq!(out.get_all("set-cookie").iter().count(), 2);
    }
}
