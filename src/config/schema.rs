use crate::error::Result;
use crate::models::TimeRange;
use serde::{Deserialize, Serialize};
use url::Url;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct DashboardConfig {
    /// Root of the Arachne analytics API. May be relative to `site_url`.
    #[serde(default = "default_analytics_base")]
    #[validate(length(min = 1))]
    pub analytics_base_url: String,

    /// Origin that relative analytics bases are resolved against.
    #[serde(default = "default_site_url")]
    #[validate(url)]
    pub site_url: String,

    /// Backend the jobs proxy forwards to.
    #[serde(default = "default_jobs_backend")]
    #[validate(url)]
    pub jobs_backend_url: String,

    #[serde(default = "default_listen_addr")]
    #[validate(length(min = 1))]
    pub listen_addr: String,

    #[serde(default)]
    pub time_range: TimeRange,

    /// Per-request timeout. Unset means the transport's own defaults apply.
    #[serde(default)]
    #[validate(range(min = 1))]
    pub request_timeout_secs: Option<u64>,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            analytics_base_url: default_analytics_base(),
            site_url: default_site_url(),
            jobs_backend_url: default_jobs_backend(),
            listen_addr: default_listen_addr(),
            time_range: TimeRange::default(),
            request_timeout_secs: None,
            user_agent: default_user_agent(),
        }
    }
}

impl DashboardConfig {
    /// The analytics root as an absolute URL string without a trailing slash.
    pub fn analytics_base(&self) -> Result<String> {
        let base = self.analytics_base_url.trim();
        let resolved = match Url::parse(base) {
            Ok(url) => url,
            Err(url::ParseError::RelativeUrlWithoutBase) => Url::parse(&self.site_url)?.join(base)?,
            Err(e) => return Err(e.into()),
        };
        Ok(strip_trailing_slash(resolved.as_str()).to_string())
    }

    pub fn jobs_backend(&self) -> String {
        strip_trailing_slash(self.jobs_backend_url.trim()).to_string()
    }
}

pub(crate) fn strip_trailing_slash(s: &str) -> &str {
    s.strip_suffix('/').unwrap_or(s)
}

fn default_analytics_base() -> String {
    "/api/arachne".to_string()
}

fn default_site_url() -> String {
    "http://localhost:3000".to_string()
}

fn default_jobs_backend() -> String {
    "http://localhost:8080".to_string()
}

fn default_listen_addr() -> String {
    "127.0.0.1:3000".to_string()
}

fn default_user_agent() -> String {
    "Arachne-Dashboard/1.0".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relative_base_resolves_against_site() {
        let config = DashboardConfig::default();
        assert_eq!(config.analytics_base().unwrap(), "http://localhost:3000/api/arachne");
    }

    #[test]
    fn absolute_base_strips_trailing_slash() {
        let config = DashboardConfig {
            analytics_base_url: "  https://arachne.example.com/  ".into(),
            ..Default::default()
        };
        assert_eq!(config.analytics_base().unwrap(), "https://arachne.example.com");

        let config = DashboardConfig {
            analytics_base_url: "http://10.0.0.5:8080/scraper/".into(),
            ..Default::default()
        };
        assert_eq!(config.analytics_base().unwrap(), "http://10.0.0.5:8080/scraper");
    }

    #[test]
    fn jobs_backend_strips_trailing_slash() {
        let config = DashboardConfig {
            jobs_backend_url: "http://scraper:8080/".into(),
            ..Default::default()
        };
        assert_eq!(config.jobs_backend(), "http://scraper:8080");
    }

    #[test]
    fn defaults_validate() {
        assert!(DashboardConfig::default().validate().is_ok());
    }
}
