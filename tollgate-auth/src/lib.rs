//! Tollgate token service: credentials, access tokens and refresh-token rotation.

pub mod config;
pub mod models;
pub mod routes;
pub mod schema;
pub mod services;
pub mod store;

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

use config::AppConfig;
use services::TokenService;
use store::CredentialStore;

pub struct AppState {
    pub config: AppConfig,
    pub tokens: TokenService,
}

impl AppState {
    pub fn new(config: AppConfig, store: Arc<dyn CredentialStore>) -> anyhow::Result<Self> {
        let tokens = TokenService::new(store, &config)?;
        Ok(Self { config, tokens })
    }
}

/// Token service routes mounted under `/auth`, plus `/health` at the root.
pub fn router(state: Arc<AppState>) -> Router {
    let auth = Router::new()
        .route("/register", post(routes::register::register))
        .route("/login", post(routes::login::login))
        .route("/refresh", post(routes::refresh::refresh_token))
        .route("/logout", post(routes::logout::logout))
        .route("/validate", post(routes::validate::validate_token))
        .route(
            "/profile",
            get(routes::profile::get_profile).delete(routes::profile::delete_profile),
        );

    Router::new()
        .route("/health", get(routes::health::health_check))
        .nest("/auth", auth)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
