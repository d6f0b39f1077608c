//! OS signal handling.
//!
//! SIGINT (ctrl-c) and SIGTERM both trigger graceful shutdown. There is no
//! reload signal: the registry is immutable for the life of the process.

use std::sync::Arc;

use tokio::task::JoinHandle;

use crate::lifecycle::shutdown::Shutdown;

/// Wait for SIGINT or SIGTERM.
pub async fn wait_for_termination() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for ctrl-c");
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
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!(signal = "SIGINT", "Shutdown signal received"),
        _ = terminate => tracing::info!(signal = "SIGTERM", "Shutdown signal received"),
    }
}

/// Trigger `shutdown` on the first termination signal.
pub fn spawn_signal_handler(shutdown: Arc<Shutdown>) -> JoinHandle<()> {
    tokio::spawn(async move {
        wait_for_termination().await;
        shutdown.trigger();
    })
}
