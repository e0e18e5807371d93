use crate::config::schema::DashboardConfig;
use crate::error::{Error, Result};
use std::fs;
use std::path::Path;
use validator::Validate;

/// Analytics API root, visible to the dashboard client.
pub const ANALYTICS_URL_ENV: &str = "NEXT_PUBLIC_SCRAPER_API_URL";
/// Backend root for the jobs proxy.
pub const JOBS_BACKEND_ENV: &str = "SCRAPER_API_URL";

pub struct ConfigLoader;

impl ConfigLoader {
    /// Loads the config file (if any), applies process environment overrides
    /// and validates the result.
    pub fn load(path: Option<&Path>) -> Result<DashboardConfig> {
        Self::load_with_env(path, |key| std::env::var(key).ok())
    }

    pub fn load_with_env<F>(path: Option<&Path>, lookup: F) -> Result<DashboardConfig>
    where
        F: Fn(&str) -> Option<String>,
    {
        let config = match path {
            Some(path) => Self::load_file(path)?,
            None => DashboardConfig::default(),
        };

        let config = Self::apply_env_overrides(config, lookup);
        config.validate()?;
        Ok(config)
    }

    fn load_file(path: &Path) -> Result<DashboardConfig> {
        let content = fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;

        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Ok(serde_json::from_str(&content)?),
            Some("yaml") | Some("yml") => Ok(serde_yaml::from_str(&content)?),
            Some("toml") => Ok(toml::from_str(&content)?),
            _ => Err(Error::Config(format!(
                "Unsupported file extension: {}",
                path.display()
            ))),
        }
    }

    fn apply_env_overrides<F>(mut config: DashboardConfig, lookup: F) -> DashboardConfig
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(val) = lookup(ANALYTICS_URL_ENV).filter(|v| !v.trim().is_empty()) {
            log::debug!("{} overrides analytics base", ANALYTICS_URL_ENV);
            config.analytics_base_url = val;
        }
        if let Some(val) = lookup(JOBS_BACKEND_ENV).filter(|v| !v.trim().is_empty()) {
            log::debug!("{} overrides jobs backend", JOBS_BACKEND_ENV);
            config.jobs_backend_url = val;
        }
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TimeRange;
    use std::collections::HashMap;
    use std::io::Write;
    use tempfile::Builder;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    fn write_config(suffix: &str, content: &str) -> tempfile::NamedTempFile {
        let mut file = Builder::new().suffix(suffix).tempfile().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn defaults_without_file() {
        let config = ConfigLoader::load_with_env(None, no_env).unwrap();
        assert_eq!(config.analytics_base_url, "/api/arachne");
        assert_eq!(config.jobs_backend_url, "http://localhost:8080");
        assert_eq!(config.time_range, TimeRange::Month);
        assert_eq!(config.request_timeout_secs, None);
    }

    #[test]
    fn loads_toml() {
        let file = write_config(
            ".toml",
            r#"
analytics_base_url = "https://arachne.internal"
time_range = 7
request_timeout_secs = 5
"#,
        );
        let config = ConfigLoader::load_with_env(Some(file.path()), no_env).unwrap();
        assert_eq!(config.analytics_base_url, "https://arachne.internal");
        assert_eq!(config.time_range, TimeRange::Week);
        assert_eq!(config.request_timeout_secs, Some(5));
        assert_eq!(config.site_url, "http://localhost:3000");
    }

    #[test]
    fn loads_yaml_and_json() {
        let yaml = write_config(".yaml", "jobs_backend_url: http://scraper:9000\ntime_range: 90\n");
        let config = ConfigLoader::load_with_env(Some(yaml.path()), no_env).unwrap();
        assert_eq!(config.jobs_backend_url, "http://scraper:9000");
        assert_eq!(config.time_range, TimeRange::Quarter);

        let json = write_config(".json", r#"{"listen_addr": "0.0.0.0:4000"}"#);
        let config = ConfigLoader::load_with_env(Some(json.path()), no_env).unwrap();
        assert_eq!(config.listen_addr, "0.0.0.0:4000");
    }

    #[test]
    fn rejects_unknown_time_range() {
        let file = write_config(".toml", "time_range = 14\n");
        assert!(ConfigLoader::load_with_env(Some(file.path()), no_env).is_err());
    }

    #[test]
    fn rejects_unsupported_extension() {
        let file = write_config(".ini", "x=1");
        let err = ConfigLoader::load_with_env(Some(file.path()), no_env).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn env_overrides_file_values() {
        let file = write_config(
            ".toml",
            "analytics_base_url = \"http://from-file\"\njobs_backend_url = \"http://from-file:8080\"\n",
        );
        let env: HashMap<&str, &str> = HashMap::from([
            (ANALYTICS_URL_ENV, "https://from-env/api/"),
            (JOBS_BACKEND_ENV, "http://backend-env:8080"),
        ]);
        let config = ConfigLoader::load_with_env(Some(file.path()), |k| {
            env.get(k).map(|v| v.to_string())
        })
        .unwrap();
        assert_eq!(config.analytics_base_url, "https://from-env/api/");
        assert_eq!(config.jobs_backend_url, "http://backend-env:8080");
    }

    #[test]
    fn blank_env_is_ignored() {
        let config = ConfigLoader::load_with_env(None, |k| {
            (k == JOBS_BACKEND_ENV).then(|| "  ".to_string())
        })
        .unwrap();
        assert_eq!(config.jobs_backend_url, "http://localhost:8080");
    }

    #[test]
    fn invalid_backend_url_fails_validation() {
        let err = ConfigLoader::load_with_env(None, |k| {
            (k == JOBS_BACKEND_ENV).then(|| "not a url".to_string())
        })
        .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }
}
