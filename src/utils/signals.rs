//! Signal handling for graceful shutdown

use futures::stream::StreamExt;
use signal_hook_tokio::Signals;
use tracing::info;

/// Wait for a shutdown signal (SIGTERM, SIGINT or SIGQUIT).
///
/// Running engines are not persisted; shutting down abandons any in-progress
/// countdowns by design of the data model.
pub async fn shutdown_signal() {
    let signals = Signals::new([
        signal_hook::consts::SIGTERM,
        signal_hook::consts::SIGINT,
        signal_hook::consts::SIGQUIT,
    ]);
    let mut signals = match signals {
        Ok(signals) => signals,
        Err(e) => {
            tracing::error!("Failed to install signal handler: {}", e);
            // Without signals the server simply runs until killed.
            futures::future::pending::<()>().await;
            return;
        }
    };

    if let Some(signal) = signals.next().await {
        info!("Received signal: {}", signal);
    }
}
