use std::sync::Arc;
use std::time::Duration;

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use tollgate_shared::{ApiResponse, HealthCheck, HealthResponse, HealthStatus};

use crate::AppState;

const HEALTH_CHECK_TIMEOUT: Duration = Duration::from_secs(3);

/// Liveness of the gateway itself.
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse::healthy("tollgate-gateway", env!("CARGO_PKG_VERSION")))
}

/// Check each backend's `/health`. Always 200; the body carries the verdict.
pub async fn status(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let mut checks = Vec::with_capacity(state.routes.routes().len());

    for route in state.routes.routes() {
        let check = match state
            .http_client
            .get(route.health_url())
            .timeout(HEALTH_CHECK_TIMEOUT)
            .send()
            .await
        {
            Ok(resp) if resp.status().is_success() => HealthCheck {
                name: route.name.to_string(),
                status: HealthStatus::Healthy,
                message: None,
            },
            Ok(resp) => HealthCheck {
                name: route.name.to_string(),
                status: HealthStatus::Degraded,
                message: Some(format!("status {}", resp.status())),
            },
            Err(e) => {
                tracing::warn!(upstream = %route.name, error = %e, "health check failed");
                HealthCheck {
                    name: route.name.to_string(),
                    status: HealthStatus::Unhealthy,
                    message: Some("unreachable".to_string()),
                }
            }
        };
        checks.push(check);
    }

    Json(HealthResponse::healthy("tollgate-gateway", env!("CARGO_PKG_VERSION")).with_checks(checks))
}

#[derive(Debug, Serialize)]
pub struct IndexResponse {
    pub service: &'static str,
    pub version: &'static str,
    pub routes: Vec<RouteInfo>,
}

#[derive(Debug, Serialize)]
pub struct RouteInfo {
    pub prefix: &'static str,
    pub service: &'static str,
}

pub async fn index(State(state): State<Arc<AppState>>) -> Json<ApiResponse<IndexResponse>> {
    let routes = state
        .routes
        .routes()
        .iter()
        .map(|r| RouteInfo {
            prefix: r.prefix,
            service: r.name,
        })
        .collect();

    Json(ApiResponse::ok_with_message(
        IndexResponse {
            service: "tollgate-gateway",
            version: env!("CARGO_PKG_VERSION"),
            routes,
        },
        "Tollgate API gateway",
    ))
}

/// Returns Prometheus metrics.
pub async fn metrics(State(state): State<Arc<AppState>>) -> String {
    state.metrics_handle.render()
}
