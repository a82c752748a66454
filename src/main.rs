//! CourierHub VK Bot
//!
//! Main application entry point

use std::sync::Arc;
use anyhow::Context;
use tokio::sync::watch;
use tracing::{error, info};

use CourierHub::{
    config::Settings,
    database::{create_pool, run_migrations, DatabaseService, PoolOptions, Store},
    server::build_app,
    services::{AcceptanceMonitor, MessagingGateway, VkGateway},
    state::AppContext,
    utils::logging,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    // Load configuration
    let settings = Settings::new().context("failed to load configuration")?;
    settings.validate()?;

    // Initialize logging; the guard flushes the file writer on exit
    let _log_guard = logging::init_logging(&settings.logging)?;

    info!("Starting {}...", CourierHub::info());

    // Initialize database connection
    info!("Connecting to database...");
    let pool = create_pool(&settings.database, &PoolOptions::default()).await?;
    run_migrations(&pool).await?;

    let store: Arc<dyn Store> = Arc::new(DatabaseService::new(pool));
    let gateway: Arc<dyn MessagingGateway> = Arc::new(VkGateway::new(settings.bot.clone())?);

    let bind_address = settings.server.bind_address.clone();
    let ctx = AppContext::new(settings, store.clone(), gateway);

    // Acceptance deadlines are swept in the background
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let monitor = AcceptanceMonitor::new(store, ctx.orders.clone());
    let monitor_handle = tokio::spawn(monitor.run(shutdown_rx));

    let app = build_app(ctx);
    let listener = tokio::net::TcpListener::bind(&bind_address)
        .await
        .with_context(|| format!("failed to bind {}", bind_address))?;

    info!(address = %bind_address, "CourierHub bot is ready!");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    let _ = shutdown_tx.send(true);
    if let Err(e) = monitor_handle.await {
        error!(error = %e, "Acceptance monitor stopped abnormally");
    }

    info!("CourierHub bot has been shut down.");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for shutdown signal");
    }
    info!("Shutdown signal received");
}
