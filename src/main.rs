//!
//! Billing-cycle batch runner for the AquaBill core.
//! Reads configuration from TOML file (~/.config/aquabill/config.toml).

use std::sync::Arc;

use sea_orm_migration::MigratorTrait;
use tracing::{error, info, warn};

use aquabill::application::services::{BatchRunner, CycleClosureService, PricingService};
use aquabill::config::AppConfig;
use aquabill::infrastructure::database::migrator::Migrator;
use aquabill::shared::shutdown::{listen_for_shutdown_signals, ShutdownSignal};
use aquabill::{
    create_event_bus, default_config_path, init_database, DatabaseConfig, SeaOrmRepositoryProvider,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // ── Load configuration ─────────────────────────────────────
    let config_path = std::env::var("AQUABILL_CONFIG")
        .map(std::path::PathBuf::from)
        .unwrap_or_else(|_| default_config_path());
    let app_cfg = match AppConfig::load(&config_path) {
        Ok(cfg) => {
            // Initialize logging with configured level
            tracing_subscriber::fmt()
                .with_env_filter(
                    tracing_subscriber::EnvFilter::try_from_default_env()
                        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&cfg.logging.level)),
                )
                .init();
            info!("Configuration loaded from {}", config_path.display());
            cfg
        }
        Err(e) => {
            tracing_subscriber::fmt()
                .with_env_filter(tracing_subscriber::EnvFilter::new("info"))
                .init();
            error!("Failed to load config: {}. Using defaults.", e);
            AppConfig::default()
        }
    };

    info!("Starting AquaBill billing core...");

    // ── Database ───────────────────────────────────────────────
    let db_config = DatabaseConfig {
        url: app_cfg.database.connection_url(),
    };
    let db = match init_database(&db_config).await {
        Ok(db) => db,
        Err(e) => {
            error!("Failed to connect to database: {}", e);
            return Err(e.into());
        }
    };

    info!("Running database migrations...");
    if let Err(e) = Migrator::up(&db, None).await {
        error!("Failed to run migrations: {}", e);
        return Err(e.into());
    }
    info!("Migrations completed");

    // Initialize repository provider
    let repos: Arc<dyn aquabill::domain::RepositoryProvider> =
        Arc::new(SeaOrmRepositoryProvider::new(db.clone()));

    // Initialize event bus and attach the alert logger before any closure runs
    let event_bus = create_event_bus();
    let mut alert_subscriber = event_bus.subscribe();
    let alert_task = tokio::spawn(async move {
        while let Some(message) = alert_subscriber.recv().await {
            if message.event.is_alert() {
                error!(
                    "ALERT: {} (meter {:?})",
                    message.event.event_type(),
                    message.event.meter_id()
                );
            } else {
                info!(
                    "Billing event: {} (meter {:?})",
                    message.event.event_type(),
                    message.event.meter_id()
                );
            }
        }
    });

    // Initialize services
    let pricing = Arc::new(PricingService::new(repos.clone(), event_bus.clone()));
    let cycles = Arc::new(CycleClosureService::new(
        repos.clone(),
        pricing,
        event_bus.clone(),
    ));
    let runner = BatchRunner::new(repos, cycles, app_cfg.billing.carry_balance);

    // Initialize shutdown signal and start listening for SIGTERM/SIGINT
    let shutdown = ShutdownSignal::new();
    tokio::spawn(listen_for_shutdown_signals(shutdown.clone()));

    // ── Run the batch ──────────────────────────────────────────
    info!("Starting billing-cycle batch. Press Ctrl+C to stop gracefully.");
    match runner.run(&shutdown).await {
        Ok(report) => {
            if report.cancelled {
                warn!("Batch cancelled by shutdown: {}", report);
            } else {
                info!("Batch finished: {}", report);
            }
            for (meter_id, err) in &report.failed {
                error!("Meter {} failed: {}", meter_id, err);
            }
        }
        Err(e) => {
            error!("Batch aborted: {}", e);
        }
    }

    // Perform final cleanup
    drop(event_bus);
    alert_task.abort();

    if let Err(e) = db.close().await {
        warn!("Error closing database connection: {}", e);
    } else {
        info!("Database connection closed");
    }

    info!("AquaBill shutdown complete");
    Ok(())
}
