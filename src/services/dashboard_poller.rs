use crate::error::{AppError, AppResult};
use crate::metrics::current_date;
use crate::services::{BookingOverview, BookingService, PriceAlert, PriceAlertService};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::{self, MissedTickBehavior};
use tracing::{error, info, warn};

/// Result of one dashboard refresh
#[derive(Debug, Clone, Serialize)]
pub struct DashboardSnapshot {
    pub refreshed_at: DateTime<Utc>,
    pub bookings: Vec<BookingOverview>,
    pub alerts: Vec<PriceAlert>,
}

/// Periodically rebuilds the dashboard and checks for price alerts
pub struct DashboardPoller {
    booking_service: Arc<BookingService>,
    alert_service: PriceAlertService,
    poll_interval: Duration,
    fetch_timeout: Duration,
    latest: Arc<RwLock<Option<DashboardSnapshot>>>,
}

impl DashboardPoller {
    /// Create a new dashboard poller
    pub fn new(booking_service: Arc<BookingService>, alert_service: PriceAlertService) -> Self {
        Self {
            booking_service,
            alert_service,
            poll_interval: Duration::from_secs(30), // Default: 30 seconds
            fetch_timeout: Duration::from_secs(10),
            latest: Arc::new(RwLock::new(None)),
        }
    }

    /// Set poll interval
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Set the bound on a single dashboard fetch
    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = timeout;
        self
    }

    /// Shared handle to the most recent snapshot, for readers outside the poll loop
    pub fn snapshot_handle(&self) -> Arc<RwLock<Option<DashboardSnapshot>>> {
        self.latest.clone()
    }

    /// Most recent successful snapshot
    pub async fn latest(&self) -> Option<DashboardSnapshot> {
        self.latest.read().await.clone()
    }

    /// Start polling. Never returns
    pub async fn start(self) {
        let mut interval = time::interval(self.poll_interval);
        // A slow poll delays the next one instead of stacking ticks behind it
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        info!(
            "Dashboard poller started, polling every {:?} (alert threshold {})",
            self.poll_interval,
            self.alert_service.threshold()
        );

        loop {
            interval.tick().await;

            if let Err(e) = self.poll_once().await {
                error!("Error in dashboard poller: {}", e);
            }
        }
    }

    /// Refresh the dashboard once. On failure the previous snapshot is kept
    pub async fn poll_once(&self) -> AppResult<DashboardSnapshot> {
        let bookings = time::timeout(self.fetch_timeout, self.booking_service.dashboard())
            .await
            .map_err(|_| {
                AppError::Timeout(format!("dashboard fetch exceeded {:?}", self.fetch_timeout))
            })??;

        let alerts = self
            .alert_service
            .check(&bookings, current_date());

        for alert in &alerts {
            warn!(
                "Price alert: {} {} now {} (holding {}, {} cheaper)",
                alert.location, alert.category, alert.new_price, alert.holding_price, alert.price_drop
            );
        }

        let snapshot = DashboardSnapshot {
            refreshed_at: Utc::now(),
            bookings,
            alerts,
        };

        info!(
            "Dashboard refreshed: {} bookings, {} alerts",
            snapshot.bookings.len(),
            snapshot.alerts.len()
        );

        *self.latest.write().await = Some(snapshot.clone());
        Ok(snapshot)
    }
}
