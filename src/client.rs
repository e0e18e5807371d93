use crate::config::DashboardConfig;
use crate::error::{Error, Result};
use crate::models::{
    AnalyticsSummary, DashboardSnapshot, DomainStats, RecentScrape, TimeRange, TimeSeriesDataPoint,
};
use async_trait::async_trait;
use futures::future::try_join4;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use std::time::Duration;

pub const DOMAINS_LIMIT: usize = 10;
pub const RECENT_LIMIT: usize = 20;

/// Anything that can produce one full dashboard snapshot for a time range.
#[async_trait]
pub trait AnalyticsSource: Send + Sync {
    async fn fetch_snapshot(&self, range: TimeRange) -> Result<DashboardSnapshot>;
}

/// The four analytics URLs requested by one fetch cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub summary: String,
    pub time_series: String,
    pub domains: String,
    pub recent: String,
}

impl Endpoints {
    pub fn new(base: &str, range: TimeRange) -> Self {
        let base = crate::config::schema::strip_trailing_slash(base.trim());
        Self {
            summary: format!("{}/api/v1/analytics/summary", base),
            time_series: format!("{}/api/v1/analytics/timeseries?days={}", base, range.days()),
            domains: format!("{}/api/v1/analytics/domains?limit={}", base, DOMAINS_LIMIT),
            recent: format!("{}/api/v1/analytics/recent?limit={}", base, RECENT_LIMIT),
        }
    }
}

pub struct AnalyticsClient {
    base: String,
    client: Client,
}

impl AnalyticsClient {
    pub fn new(base: impl Into<String>, client: Client) -> Self {
        Self {
            base: base.into(),
            client,
        }
    }

    pub fn from_config(config: &DashboardConfig) -> Result<Self> {
        Ok(Self::new(config.analytics_base()?, build_http_client(config)?))
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    async fn get(&self, url: &str) -> Result<Response> {
        log::debug!("GET {}", url);
        Ok(self.client.get(url).send().await?)
    }
}

#[async_trait]
impl AnalyticsSource for AnalyticsClient {
    async fn fetch_snapshot(&self, range: TimeRange) -> Result<DashboardSnapshot> {
        let endpoints = Endpoints::new(&self.base, range);

        // All four requests are in flight before any is awaited.
        let (summary, time_series, domains, recent) = try_join4(
            self.get(&endpoints.summary),
            self.get(&endpoints.time_series),
            self.get(&endpoints.domains),
            self.get(&endpoints.recent),
        )
        .await?;

        let failed: Vec<_> = [&summary, &time_series, &domains, &recent]
            .into_iter()
            .filter(|res| !res.status().is_success())
            .map(|res| (res.url().to_string(), res.status()))
            .collect();
        if !failed.is_empty() {
            for (url, status) in &failed {
                log::warn!("Analytics request {} returned {}", url, status);
            }
            return Err(Error::UpstreamStatus(failed));
        }

        let (summary, time_series, mut domains, mut recent) = try_join4(
            decode::<AnalyticsSummary>(summary),
            decode::<Vec<TimeSeriesDataPoint>>(time_series),
            decode::<Vec<DomainStats>>(domains),
            decode::<Vec<RecentScrape>>(recent),
        )
        .await?;

        cap_rows(&mut domains, DOMAINS_LIMIT, "domains");
        cap_rows(&mut recent, RECENT_LIMIT, "recent scrapes");

        log::info!(
            "Fetched analytics: {} scrapes, {} days of activity, {} domains, {} recent",
            summary.total_scrapes,
            time_series.len(),
            domains.len(),
            recent.len()
        );

        Ok(DashboardSnapshot {
            summary,
            time_series,
            domains,
            recent,
        })
    }
}

async fn decode<T: DeserializeOwned>(res: Response) -> Result<T> {
    Ok(res.json::<T>().await?)
}

fn cap_rows<T>(rows: &mut Vec<T>, limit: usize, what: &str) {
    if rows.len() > limit {
        log::warn!(
            "Backend returned {} {} (limit {}), truncating",
            rows.len(),
            what,
            limit
        );
        rows.truncate(limit);
    }
}

pub fn build_http_client(config: &DashboardConfig) -> Result<Client> {
    let mut builder = Client::builder().user_agent(config.user_agent.clone());
    if let Some(secs) = config.request_timeout_secs {
        builder = builder.timeout(Duration::from_secs(secs));
    }
    Ok(builder.build()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoints_carry_range_and_limits() {
        for range in TimeRange::ALL {
            let endpoints = Endpoints::new("http://api.test/", range);
            assert_eq!(endpoints.summary, "http://api.test/api/v1/analytics/summary");
            assert_eq!(
                endpoints.time_series,
                format!("http://api.test/api/v1/analytics/timeseries?days={}", range.days())
            );
            assert_eq!(endpoints.domains, "http://api.test/api/v1/analytics/domains?limit=10");
            assert_eq!(endpoints.recent, "http://api.test/api/v1/analytics/recent?limit=20");
        }
    }

    #[test]
    fn cap_rows_truncates_only_when_over() {
        let mut rows: Vec<u32> = (0..25).collect();
        cap_rows(&mut rows, RECENT_LIMIT, "rows");
        assert_eq!(rows.len(), 20);
        assert_eq!(rows[19], 19);

        let mut short = vec![1, 2, 3];
        cap_rows(&mut short, DOMAINS_LIMIT, "rows");
        assert_eq!(short, vec![1, 2, 3]);
    }
}
