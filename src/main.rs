//! Rental Tracker Service
//!
//! Main entry point for the car-rental price tracker backend.
//! This service provides:
//! - Storage for tracked bookings and their price checks
//! - A background poller that refreshes the dashboard and raises price alerts

use rental_tracker::config::{AppConfig, LogFormat, StorageBackend};
use rental_tracker::{AppError, AppResult, AppState};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

fn init_tracing(config: &AppConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("rental_tracker={},sqlx=warn", config.log_level).into());

    match config.log_format {
        LogFormat::Json => tracing_subscriber::fmt().json().with_env_filter(filter).init(),
        LogFormat::Pretty => tracing_subscriber::fmt().with_env_filter(filter).init(),
    }
}

#[tokio::main]
async fn main() -> AppResult<()> {
    // Load environment variables first
    dotenv::dotenv().ok();

    // Load configuration
    let config = AppConfig::from_env().map_err(|e| {
        eprintln!("Configuration error: {}", e);
        AppError::Config(e)
    })?;

    // Initialize tracing/logging with config
    init_tracing(&config);

    info!("Rental tracker starting");
    info!("Environment: {}", config.environment);
    info!("Log level: {}", config.log_level);
    info!("Poll interval: {}s", config.poller.poll_interval_secs);
    info!("Alert threshold: {}", config.poller.alert_threshold);
    if config.is_production() && config.storage == StorageBackend::Memory {
        warn!("In-memory storage in production: bookings are lost on restart");
    }

    let app_state = AppState::from_config(&config).await.map_err(|e| {
        error!("Failed to initialize storage: {}", e);
        if e.is_connection_error() {
            error!("Check DATABASE_URL or set STORAGE_BACKEND=memory");
        }
        e
    })?;
    info!("✓ Application state initialized");

    let poller = app_state.dashboard_poller(&config);
    let poller_handle = tokio::spawn(async move {
        poller.start().await;
    });
    info!("✓ Dashboard poller started");
    info!("Press Ctrl+C to shutdown gracefully");

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("Shutdown signal received, shutting down gracefully...");
        }
        _ = poller_handle => {
            error!("Dashboard poller exited unexpectedly");
        }
    }

    info!("Rental tracker shutdown complete");
    Ok(())
}
