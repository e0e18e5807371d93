pub mod client;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod format;
pub mod models;
pub mod output;
pub mod proxy;

pub use client::{AnalyticsClient, AnalyticsSource};
pub use dashboard::{Dashboard, DashboardState, DashboardView};
pub use error::{Error, Result};
pub use models::{DashboardSnapshot, TimeRange};
