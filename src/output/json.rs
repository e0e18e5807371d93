use super::DashboardRenderer;
use crate::dashboard::{DashboardState, DashboardView};
use crate::error::Result;
use async_trait::async_trait;
use serde_json::{Value, json};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;

/// Writes the committed view as one JSON document, to a file or stdout.
pub struct JsonOutput {
    path: Option<PathBuf>,
}

impl JsonOutput {
    pub fn new(path: Option<PathBuf>) -> Self {
        Self { path }
    }
}

pub fn view_to_json(view: &DashboardView) -> Result<Value> {
    let mut doc = json!({
        "time_range_days": view.time_range.days(),
        "retry_count": view.retry_count,
        "loading": view.state.is_loading(),
        "error": view.state.error(),
        "summary": Value::Null,
    });

    if let DashboardState::Loaded(snapshot) = &view.state {
        doc["summary"] = serde_json::to_value(&snapshot.summary)?;
        doc["time_series"] = serde_json::to_value(&snapshot.time_series)?;
        doc["domains"] = serde_json::to_value(&snapshot.domains)?;
        doc["recent"] = serde_json::to_value(&snapshot.recent)?;
    }
    Ok(doc)
}

#[async_trait]
impl DashboardRenderer for JsonOutput {
    async fn render(&mut self, view: &DashboardView) -> Result<()> {
        let doc = view_to_json(view)?;

        match &self.path {
            Some(path) => {
                let mut file = OpenOptions::new()
                    .create(true)
                    .write(true)
                    .truncate(true)
                    .open(path)?;
                serde_json::to_writer_pretty(&mut file, &doc)?;
                writeln!(file)?;
            }
            None => println!("{}", serde_json::to_string_pretty(&doc)?),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DashboardSnapshot, TimeRange};

    #[test]
    fn failed_view_has_no_summary() {
        let view = DashboardView {
            time_range: TimeRange::Quarter,
            retry_count: 1,
            state: DashboardState::Failed("boom".into()),
        };
        let doc = view_to_json(&view).unwrap();
        assert_eq!(doc["time_range_days"], 90);
        assert_eq!(doc["error"], "boom");
        assert!(doc["summary"].is_null());
        assert_eq!(doc["loading"], false);
    }

    #[tokio::test]
    async fn writes_loaded_view_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dashboard.json");
        let view = DashboardView {
            time_range: TimeRange::Month,
            retry_count: 0,
            state: DashboardState::Loaded(DashboardSnapshot::default()),
        };

        JsonOutput::new(Some(path.clone())).render(&view).await.unwrap();

        let written: Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written["summary"]["total_scrapes"], 0);
        assert!(written["error"].is_null());
        assert_eq!(written["recent"], json!([]));
    }
}
