//! Tollgate gateway: one public entry point that authorizes bearer tokens
//! and forwards traffic to the backend owning each path prefix.

pub mod config;
pub mod routes;

use std::sync::Arc;
use std::time::Duration;

use axum::http::{header, Method};
use axum::middleware;
use axum::routing::get;
use axum::Router;
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::cors::{AllowHeaders, AllowMethods, CorsLayer};
use tower_http::trace::TraceLayer;

use tollgate_shared::middleware::metrics_middleware;
use tollgate_shared::TokenSecret;

use config::{AppConfig, RouteTable};
use routes::auth::{PublicPath, DEFAULT_PUBLIC_PATHS};
use routes::{auth, health, proxy};

pub struct AppState {
    pub config: AppConfig,
    pub routes: RouteTable,
    pub public_paths: Vec<PublicPath>,
    pub access_secret: TokenSecret,
    pub http_client: reqwest::Client,
    pub metrics_handle: PrometheusHandle,
}

impl AppState {
    pub fn new(config: AppConfig, metrics_handle: PrometheusHandle) -> anyhow::Result<Self> {
        let access_secret = TokenSecret::new(&config.access_secret)?;
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.upstream_timeout_secs))
            .build()?;
        Ok(Self {
            routes: RouteTable::from_config(&config),
            public_paths: DEFAULT_PUBLIC_PATHS.to_vec(),
            access_secret,
            http_client,
            metrics_handle,
            config,
        })
    }
}

/// The gateway router. Authorization wraps every route and the proxy fallback.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(health::index))
        .route("/health", get(health::health_check))
        .route("/status", get(health::status))
        .route("/metrics", get(health::metrics))
        .fallback(proxy::proxy_handler)
        .layer(middleware::from_fn_with_state(state.clone(), auth::gateway_auth))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Browser CORS policy. Identity headers are not accepted from browsers.
pub fn cors_layer(config: &AppConfig) -> anyhow::Result<CorsLayer> {
    Ok(CorsLayer::new()
        .allow_origin(config.cors_origin_header()?)
        .allow_methods(AllowMethods::list([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ]))
        .allow_headers(AllowHeaders::list([
            header::AUTHORIZATION,
            header::CONTENT_TYPE,
            header::ACCEPT,
        ]))
        .allow_credentials(config.cors_credentials))
}
