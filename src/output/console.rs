use super::DashboardRenderer;
use crate::dashboard::{DashboardState, DashboardView};
use crate::error::{Error, Result};
use crate::format::{format_bytes, format_count, format_date, format_duration, format_percent};
use crate::models::DashboardSnapshot;
use async_trait::async_trait;
use indicatif::MultiProgress;
use std::fmt::Write;
use std::sync::Arc;

const URL_WIDTH: usize = 48;

pub struct ConsoleOutput {
    multi: Option<Arc<MultiProgress>>,
}

impl ConsoleOutput {
    pub fn new(multi: Option<Arc<MultiProgress>>) -> Self {
        Self { multi }
    }
}

impl Default for ConsoleOutput {
    fn default() -> Self {
        Self::new(None)
    }
}

#[async_trait]
impl DashboardRenderer for ConsoleOutput {
    async fn render(&mut self, view: &DashboardView) -> Result<()> {
        let output = render_text(view)?;

        if let Some(multi) = &self.multi {
            for line in output.lines() {
                multi.println(line).map_err(|e| Error::Internal(e.to_string()))?;
            }
        } else {
            for line in output.lines() {
                println!("{}", line);
            }
        }
        Ok(())
    }
}

/// Renders the whole dashboard view as plain text.
pub fn render_text(view: &DashboardView) -> Result<String> {
    match &view.state {
        DashboardState::Idle => Ok("Analytics not loaded yet.\n".to_string()),
        DashboardState::Loading => Ok("Loading analytics...\n".to_string()),
        DashboardState::Failed(message) => render_failure(message),
        DashboardState::Loaded(snapshot) => render_snapshot(view, snapshot),
    }
}

fn render_failure(message: &str) -> Result<String> {
    let mut out = String::new();
    writeln!(out, "❌ Unable to load analytics")?;
    writeln!(out, "   {}", message)?;
    writeln!(out, "   Press 'r' to retry.")?;
    Ok(out)
}

fn render_snapshot(view: &DashboardView, snapshot: &DashboardSnapshot) -> Result<String> {
    let summary = &snapshot.summary;
    let mut out = String::new();

    writeln!(out, "Analytics Dashboard ({})", view.time_range)?;
    writeln!(out)?;

    writeln!(out, "  Total Scrapes   {}", format_count(summary.total_scrapes))?;
    writeln!(
        out,
        "  Success Rate    {}  ({} / {} successful)",
        format_percent(summary.success_rate),
        summary.successful_scrapes,
        summary.total_scrapes
    )?;
    writeln!(
        out,
        "  Avg Duration    {}  (Fastest: {})",
        format_duration(summary.average_duration_seconds),
        format_duration(summary.fastest_scrape_seconds)
    )?;
    writeln!(
        out,
        "  Data Scraped    {}  (Avg: {})",
        format_bytes(summary.total_data_bytes as f64),
        format_bytes(summary.average_scrape_bytes)
    )?;
    writeln!(out)?;

    writeln!(out, "Scraping Activity")?;
    if snapshot.time_series.is_empty() {
        writeln!(out, "  (no activity)")?;
    }
    for point in &snapshot.time_series {
        writeln!(
            out,
            "  {:<12} {:>8} scrapes  {:>7}  {:>10}  {:>12}",
            point.date,
            format_count(point.scrapes_count),
            format_percent(point.success_rate),
            format_duration(point.avg_duration_seconds),
            format_bytes(point.total_data_bytes as f64)
        )?;
    }
    writeln!(out)?;

    let breakdown = summary.status_breakdown();
    let [successful_label, failed_label] = breakdown.labels();
    writeln!(out, "Status Distribution")?;
    writeln!(out, "  {}  |  {}", successful_label, failed_label)?;
    writeln!(
        out,
        "  Successful: {}  Failed: {}",
        breakdown.successful, breakdown.failed
    )?;
    writeln!(out)?;

    writeln!(out, "Top Domains")?;
    if snapshot.domains.is_empty() {
        writeln!(out, "  (no domains)")?;
    }
    for domain in &snapshot.domains {
        writeln!(
            out,
            "  {:<32} {:>8} scrapes  {:>7}  {:>10}  {:>12}",
            domain.domain,
            format_count(domain.scrapes_count),
            format_percent(domain.success_rate),
            format_duration(domain.avg_duration_seconds),
            format_bytes(domain.total_size_bytes as f64)
        )?;
    }
    writeln!(out)?;

    writeln!(out, "Recent Scrapes")?;
    writeln!(
        out,
        "  {:<width$} {:<10} {:>10} {:>12} {:>11}",
        "URL",
        "Status",
        "Duration",
        "Size",
        "Completed",
        width = URL_WIDTH
    )?;
    for scrape in &snapshot.recent {
        let marker = if scrape.is_success() { "✓" } else { "✗" };
        writeln!(
            out,
            "  {:<width$} {} {:<8} {:>10} {:>12} {:>11}",
            truncate(&scrape.url, URL_WIDTH),
            marker,
            scrape.status,
            format_duration(scrape.duration_seconds),
            format_bytes(scrape.size_bytes as f64),
            format_date(&scrape.completed_at),
            width = URL_WIDTH
        )?;
        if let Some(error) = &scrape.error {
            writeln!(out, "    ↳ {}", error)?;
        }
    }
    writeln!(out)?;

    writeln!(out, "  Largest Scrape      {}", format_bytes(summary.largest_scrape_bytes as f64))?;
    writeln!(out, "  URLs with Changes   {}", summary.urls_with_changes)?;
    writeln!(out, "  Slowest Scrape      {}", format_duration(summary.slowest_scrape_seconds))?;
    writeln!(out, "  Unique URLs         {}", format_count(summary.unique_urls))?;
    writeln!(out, "  Total Versions      {}", format_count(summary.total_versions))?;

    Ok(out)
}

fn truncate(s: &str, width: usize) -> String {
    if s.chars().count() <= width {
        s.to_string()
    } else {
        let mut cut: String = s.chars().take(width.saturating_sub(1)).collect();
        cut.push('…');
        cut
    }
}
