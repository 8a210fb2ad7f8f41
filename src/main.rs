use std::sync::Arc;

use anyhow::Context;
use dotenv::dotenv;
use tracing::{info, warn};

use mentorship_backend::{
    config,
    create_router,
    db::{self, PgSchedulingRepository},
    telemetry::{init_telemetry, TelemetryConfig},
    AppState, SchedulingRulesService,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    let config = config::init().context("Failed to load configuration")?.clone();
    let telemetry_config = TelemetryConfig::from_app_config(&config);
    let telemetry = init_telemetry(&telemetry_config).await?;

    let pool = db::init_pool(&config.database).await?;
    let repository = Arc::new(PgSchedulingRepository::new(pool));
    let rules = Arc::new(SchedulingRulesService::new(
        repository,
        config.scheduling.booking_utc_offset,
    ));

    // Requests get 503 until a load succeeds.
    if rules.refetch().await.is_err() {
        warn!("Starting without scheduling rules until a refetch succeeds");
    }
    if let Some(every) = config.scheduling.refresh_interval {
        rules.clone().spawn_refresh(every);
    }

    let addr = config.server_addr();
    let app = create_router(AppState::new(config.clone(), rules, telemetry_config));

    info!("{} listening on {}", config.app.name, addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Failed to serve application")?;

    telemetry.shutdown().await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
    }
    info!("Shutdown signal received");
}
