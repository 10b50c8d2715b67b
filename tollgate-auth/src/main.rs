use std::sync::Arc;

use tollgate_auth::config::AppConfig;
use tollgate_auth::store::{CredentialStore, MemoryCredentialStore, PgCredentialStore};
use tollgate_auth::{router, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = AppConfig::load()?;
    tollgate_shared::middleware::init_tracing("tollgate-auth", config.is_production())?;

    let store: Arc<dyn CredentialStore> = match &config.database_url {
        Some(url) => Arc::new(PgCredentialStore::connect(url, config.db_pool_size)?),
        None => {
            tracing::warn!("no database_url configured, credentials are kept in memory");
            Arc::new(MemoryCredentialStore::new())
        }
    };

    let port = config.port;
    let state = Arc::new(AppState::new(config, store)?);
    let app = router(state);

    let addr = format!("0.0.0.0:{port}");
    tracing::info!(addr = %addr, "tollgate-auth starting");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(tollgate_shared::shutdown::shutdown_signal())
        .await?;
    tracing::info!("tollgate-auth stopped");

    Ok(())
}
