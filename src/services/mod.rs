pub mod booking_service;
pub mod dashboard_poller;
pub mod price_alert;

pub use booking_service::{BookingOverview, BookingService};
pub use dashboard_poller::{DashboardPoller, DashboardSnapshot};
pub use price_alert::{PriceAlert, PriceAlertService};
