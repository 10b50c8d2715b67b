//! Process shutdown trigger for `axum::serve(..).with_graceful_shutdown(..)`.
//!
//! Once it resolves the server stops accepting connections and lets
//! in-flight requests finish.

use std::future::Future;

/// Resolves on the first SIGINT (Ctrl+C) or, on unix, SIGTERM.
///
/// A listener that cannot be installed never fires, so a broken signal setup
/// never stops the server on its own.
pub async fn shutdown_signal() {
    let interrupt = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "cannot listen for SIGINT");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "cannot listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    first_of(interrupt, terminate).await;
}

async fn first_of(interrupt: impl Future<Output = ()>, terminate: impl Future<Output = ()>) {
    tokio::select! {
        () = interrupt => tracing::info!(signal = "SIGINT", "shutting down, draining in-flight requests"),
        () = terminate => tracing::info!(signal = "SIGTERM", "shutting down, draining in-flight requests"),
    }
}
