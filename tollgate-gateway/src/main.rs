use std::sync::Arc;

use tollgate_gateway::config::AppConfig;
use tollgate_gateway::{cors_layer, router, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = AppConfig::load()?;
    tollgate_shared::middleware::init_tracing("tollgate-gateway", config.is_production())?;

    let metrics_handle = tollgate_shared::middleware::init_metrics()?;
    let cors = cors_layer(&config)?;
    let port = config.port;

    let state = Arc::new(AppState::new(config, metrics_handle)?);
    for route in state.routes.routes() {
        tracing::info!(prefix = route.prefix, upstream = %route.base_url, "route registered");
    }

    // CORS sits outside authorization so preflight requests are answered directly.
    let app = router(state).layer(cors);

    let addr = format!("0.0.0.0:{port}");
    tracing::info!(addr = %addr, "tollgate-gateway starting");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(tollgate_shared::shutdown::shutdown_signal())
        .await?;
    tracing::info!("tollgate-gateway stopped");

    Ok(())
}
