use crate::error::{Error, Result};
use crate::format::to_fixed;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsSummary {
    pub total_scrapes: u64,
    pub successful_scrapes: u64,
    pub failed_scrapes: u64,
    /// 0-100, computed by the backend.
    pub success_rate: f64,
    pub average_duration_seconds: f64,
    pub fastest_scrape_seconds: f64,
    pub slowest_scrape_seconds: f64,
    pub largest_scrape_bytes: u64,
    pub total_data_bytes: u64,
    pub average_scrape_bytes: f64,
    pub unique_urls: u64,
    pub total_versions: u64,
    pub urls_with_changes: u64,
}

impl AnalyticsSummary {
    pub fn status_breakdown(&self) -> StatusBreakdown {
        StatusBreakdown {
            successful: self.successful_scrapes,
            failed: self.failed_scrapes,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeSeriesDataPoint {
    pub date: String,
    pub scrapes_count: u64,
    pub success_rate: f64,
    pub avg_duration_seconds: f64,
    pub total_data_bytes: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomainStats {
    pub domain: String,
    pub scrapes_count: u64,
    pub success_rate: f64,
    pub avg_duration_seconds: f64,
    pub total_size_bytes: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecentScrape {
    pub url: String,
    pub status: String,
    pub duration_seconds: f64,
    pub size_bytes: u64,
    pub completed_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RecentScrape {
    /// `success` and `completed` count as positive; every other status is negative.
    pub fn is_success(&self) -> bool {
        matches!(self.status.as_str(), "success" | "completed")
    }
}

/// Everything one successful fetch cycle produced, committed as a unit.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DashboardSnapshot {
    pub summary: AnalyticsSummary,
    pub time_series: Vec<TimeSeriesDataPoint>,
    pub domains: Vec<DomainStats>,
    pub recent: Vec<RecentScrape>,
}

/// Successful vs failed split used by the status distribution section.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusBreakdown {
    pub successful: u64,
    pub failed: u64,
}

impl StatusBreakdown {
    fn share(&self, part: u64) -> f64 {
        let total = self.successful + self.failed;
        if total == 0 {
            0.0
        } else {
            part as f64 / total as f64
        }
    }

    pub fn successful_share(&self) -> f64 {
        self.share(self.successful)
    }

    pub fn failed_share(&self) -> f64 {
        self.share(self.failed)
    }

    /// `"Successful 95%"`-style labels, successful first.
    pub fn labels(&self) -> [String; 2] {
        [
            format!("Successful {}%", to_fixed(self.successful_share() * 100.0, 0)),
            format!("Failed {}%", to_fixed(self.failed_share() * 100.0, 0)),
        ]
    }
}

/// Lookback window for the time series query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum TimeRange {
    Week,
    #[default]
    Month,
    Quarter,
}

impl TimeRange {
    pub const ALL: [TimeRange; 3] = [TimeRange::Week, TimeRange::Month, TimeRange::Quarter];

    pub fn days(self) -> u32 {
        match self {
            TimeRange::Week => 7,
            TimeRange::Month => 30,
            TimeRange::Quarter => 90,
        }
    }
}

impl TryFrom<u32> for TimeRange {
    type Error = Error;

    fn try_from(days: u32) -> Result<Self> {
        match days {
            7 => Ok(TimeRange::Week),
            30 => Ok(TimeRange::Month),
            90 => Ok(TimeRange::Quarter),
            other => Err(Error::Config(format!(
                "Unsupported time range: {} days (expected 7, 30 or 90)",
                other
            ))),
        }
    }
}

impl From<TimeRange> for u32 {
    fn from(range: TimeRange) -> Self {
        range.days()
    }
}

impl FromStr for TimeRange {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let days: u32 = s
            .trim()
            .parse()
            .map_err(|_| Error::Config(format!("Invalid time range: {:?}", s)))?;
        TimeRange::try_from(days)
    }
}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Last {} days", self.days())
    }
}
