//! Rental Tracker Library
//!
//! Tracks car-rental bookings against periodic price checks. This module
//! exposes the backend components for use by tests and other consumers.

pub mod config;
pub mod database;
pub mod error;
pub mod metrics;
pub mod models;
pub mod repositories;
pub mod services;

// Re-export commonly used types
pub use config::AppConfig;
pub use error::{AppError, AppResult};
pub use metrics::BookingMetrics;

use config::StorageBackend;
use database::{create_pool, run_migrations};
use repositories::{MemoryRepository, PostgresRepository, SeedData, TrackerRepository};
use services::{BookingService, DashboardPoller, PriceAlertService};
use std::sync::Arc;
use tracing::info;

/// Application state containing the shared services
pub struct AppState {
    pub booking_service: Arc<BookingService>,
}

impl AppState {
    /// Create a new AppState around an already-built repository
    pub fn new(repository: Arc<dyn TrackerRepository>) -> Self {
        Self {
            booking_service: Arc::new(BookingService::new(repository)),
        }
    }

    /// Build the repository selected by configuration
    pub async fn from_config(config: &AppConfig) -> AppResult<Self> {
        let repository: Arc<dyn TrackerRepository> = match config.storage {
            StorageBackend::Postgres => {
                let db_config = config.database.as_ref().ok_or_else(|| {
                    AppError::Config("postgres storage requires DATABASE_URL".to_string())
                })?;

                info!("Connecting to database...");
                let pool = create_pool(db_config).await?;
                info!("Database connection pool created (max {} connections)", db_config.max_connections);

                info!("Running database migrations...");
                run_migrations(&pool, None).await?;
                info!("Database migrations completed successfully");

                Arc::new(PostgresRepository::new(pool))
            }
            StorageBackend::Memory => match &config.seed_file {
                Some(path) => {
                    info!("Loading seed data from {}", path);
                    Arc::new(MemoryRepository::from_seed(SeedData::from_file(path).await?)?)
                }
                None => Arc::new(MemoryRepository::new()),
            },
        };

        info!("Using {} storage", config.storage.as_str());
        Ok(Self::new(repository))
    }

    /// Poller wired to this state's booking service and the configured thresholds
    pub fn dashboard_poller(&self, config: &AppConfig) -> DashboardPoller {
        DashboardPoller::new(
            self.booking_service.clone(),
            PriceAlertService::new(config.poller.alert_threshold),
        )
        .with_poll_interval(config.poller.poll_interval())
        .with_fetch_timeout(config.poller.fetch_timeout())
    }
}
