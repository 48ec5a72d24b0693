//! Ringclock - a state-managed multi-timer server
//!
//! This is the main entry point for the ringclock application.

use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::info;

use ringclock::{
    api::create_router,
    config::Config,
    services::SoundPlayer,
    state::AppState,
    tasks::alert_dispatcher_task,
    utils::shutdown_signal,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();

    // Initialize tracing with appropriate log level
    tracing_subscriber::fmt()
        .with_env_filter(format!("ringclock={},tower_http=info", config.log_level()))
        .init();

    info!("Starting ringclock server v{}", env!("CARGO_PKG_VERSION"));
    info!(
        "Configuration: host={}, port={}, audio={}",
        config.host,
        config.port,
        if config.mute { "muted" } else { "enabled" }
    );

    // Create application state plus the alert dispatcher's receiving ends
    let (state, alert_channels) = AppState::new(config.port, config.host.clone());
    let state = Arc::new(state);

    // Start the alert dispatcher with its audio thread
    let sound = SoundPlayer::spawn(!config.mute);
    let dispatcher_state = Arc::clone(&state);
    tokio::spawn(async move {
        alert_dispatcher_task(dispatcher_state, alert_channels, sound).await;
    });

    // Create HTTP router with all endpoints
    let app = create_router(Arc::clone(&state));

    // Bind to the specified address
    let addr = config.address();
    let listener = TcpListener::bind(&addr).await?;

    info!("Server running on http://{}", addr);
    info!("Endpoints:");
    info!("  POST   /api/timers/add        - Create a timer and start its engine");
    info!("  GET    /api/timers/all        - List your timers");
    info!("  DELETE /api/timers/delete/:id - Delete a timer");
    info!("  POST   /api/timers/:id/start  - Start one timer");
    info!("  POST   /api/timers/:id/pause  - Pause one timer");
    info!("  POST   /api/timers/:id/reset  - Reset one timer");
    info!("  GET    /api/clock             - Radial clock frame");
    info!("  POST   /api/clock/toggle      - Play or pause all timers");
    info!("  GET    /api/alerts/active     - Current alert");
    info!("  POST   /api/alerts/ack        - Acknowledge the current alert");
    info!("  GET    /status                - Check current status");
    info!("  GET    /health                - Health check");

    // Setup graceful shutdown
    let server = axum::serve(listener, app);

    tokio::select! {
        result = server => {
            if let Err(e) = result {
                tracing::error!("Server error: {}", e);
            }
        }
        _ = shutdown_signal() => {
            info!("Shutdown signal received");
        }
    }

    info!("Server shutdown complete");
    Ok(())
}
