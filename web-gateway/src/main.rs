use dotenvy::dotenv;
use session_core::{RefreshScheduler, SessionController};
use std::sync::Arc;
use tracing::info;
use web_gateway::config::get_configuration;
use web_gateway::startup::build_router;
use web_gateway::telemetry::init_tracing;
use web_gateway::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    let configuration = get_configuration().map_err(|e| {
        eprintln!("Failed to read configuration: {}", e);
        anyhow::anyhow!("Configuration error: {}", e)
    })?;

    init_tracing("web-gateway");

    let controller = Arc::new(SessionController::new(&configuration.client));
    controller.initialize();
    Arc::clone(&controller).spawn_event_bridge();

    let scheduler = RefreshScheduler::new(
        Arc::clone(&controller),
        configuration.client.refresh.clone(),
    );
    // Held for the life of the process; dropping it stops the refresh timer.
    let _scheduler_handle = scheduler.spawn();

    let settings = Arc::new(configuration);
    let state = AppState::new(controller, Arc::clone(&settings));
    let app = build_router(state);

    let address = format!("{}:{}", settings.server.host, settings.server.port);
    let listener = tokio::net::TcpListener::bind(&address).await.map_err(|e| {
        tracing::error!("Failed to bind TCP listener to {}: {}", address, e);
        anyhow::anyhow!("Failed to bind to address {}: {}", address, e)
    })?;

    info!("Starting web-gateway on {}", address);
    axum::serve(listener, app).await.map_err(|e| {
        tracing::error!("Server error: {}", e);
        anyhow::anyhow!("Server error: {}", e)
    })?;

    Ok(())
}
