//! Pass-through route relaying the scraper backend's job list.

use crate::config::DashboardConfig;
use crate::error::Result;
use axum::{Json, Router, extract::State, http::StatusCode, routing::get};
use reqwest::Client;
use serde_json::{Value, json};
use std::future::Future;
use tokio::net::TcpListener;

pub const JOBS_PATH: &str = "/api/jobs";
pub const JOBS_ERROR: &str = "Failed to fetch jobs";

#[derive(Clone)]
pub struct ProxyState {
    client: Client,
    backend: String,
}

impl ProxyState {
    pub fn new(backend: impl Into<String>, client: Client) -> Self {
        Self {
            backend: backend.into(),
            client,
        }
    }

    pub fn from_config(config: &DashboardConfig) -> Result<Self> {
        // The proxy forwards without its own timeout.
        let client = Client::builder().user_agent(config.user_agent.clone()).build()?;
        Ok(Self::new(config.jobs_backend(), client))
    }

    pub fn jobs_url(&self) -> String {
        format!("{}{}", self.backend, JOBS_PATH)
    }

    async fn fetch_jobs(&self) -> Result<Value> {
        let res = self.client.get(self.jobs_url()).send().await?;
        Ok(res.json::<Value>().await?)
    }
}

pub fn router(state: ProxyState) -> Router {
    Router::new()
        .route(JOBS_PATH, get(list_jobs))
        .with_state(state)
}

async fn list_jobs(State(state): State<ProxyState>) -> (StatusCode, Json<Value>) {
    match state.fetch_jobs().await {
        Ok(body) => (StatusCode::OK, Json(body)),
        Err(e) => {
            log::error!("Jobs API error: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": JOBS_ERROR })),
            )
        }
    }
}

/// Serves the proxy on an already bound listener until `shutdown` resolves.
pub async fn serve<F>(listener: TcpListener, state: ProxyState, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    log::info!(
        "Jobs proxy listening on http://{} -> {}",
        listener.local_addr()?,
        state.jobs_url()
    );
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::SocketAddr;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn spawn_proxy(backend: String) -> SocketAddr {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let state = ProxyState::new(backend, Client::new());
        tokio::spawn(serve(listener, state, std::future::pending()));
        addr
    }

    async fn get_jobs(addr: SocketAddr) -> (u16, Value) {
        let res = reqwest::get(format!("http://{}{}", addr, JOBS_PATH)).await.unwrap();
        let status = res.status().as_u16();
        (status, res.json().await.unwrap())
    }

    #[tokio::test]
    async fn relays_backend_json() {
        let backend = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/jobs"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "jobs": [] })))
            .expect(1)
            .mount(&backend)
            .await;

        let addr = spawn_proxy(backend.uri()).await;
        let (status, body) = get_jobs(addr).await;
        assert_eq!(status, 200);
        assert_eq!(body, json!({ "jobs": [] }));
    }

    #[tokio::test]
    async fn relays_backend_key_order() {
        let backend = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/jobs"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_raw(r#"{"total":1,"jobs":[{"url":"https://a.test","id":7}]}"#, "application/json"),
            )
            .mount(&backend)
            .await;

        let addr = spawn_proxy(backend.uri()).await;
        let res = reqwest::get(format!("http://{}{}", addr, JOBS_PATH)).await.unwrap();
        assert_eq!(res.status().as_u16(), 200);
        assert_eq!(
            res.text().await.unwrap(),
            r#"{"total":1,"jobs":[{"url":"https://a.test","id":7}]}"#
        );
    }

    #[tokio::test]
    async fn relays_json_even_when_backend_status_is_an_error() {
        let backend = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/jobs"))
            .respond_with(ResponseTemplate::new(503).set_body_json(json!({ "detail": "busy" })))
            .mount(&backend)
            .await;

        let addr = spawn_proxy(backend.uri()).await;
        let (status, body) = get_jobs(addr).await;
        assert_eq!(status, 200);
        assert_eq!(body, json!({ "detail": "busy" }));
    }

    #[tokio::test]
    async fn unreachable_backend_yields_500() {
        let addr = spawn_proxy("http://127.0.0.1:1".to_string()).await;
        let (status, body) = get_jobs(addr).await;
        assert_eq!(status, 500);
        assert_eq!(body, json!({ "error": "Failed to fetch jobs" }));
    }

    #[tokio::test]
    async fn non_json_body_yields_500() {
        let backend = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/jobs"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&backend)
            .await;

        let addr = spawn_proxy(backend.uri()).await;
        let (status, body) = get_jobs(addr).await;
        assert_eq!(status, 500);
        assert_eq!(body, json!({ "error": "Failed to fetch jobs" }));
    }

    #[test]
    fn jobs_url_from_config_strips_slash() {
        let config = DashboardConfig {
            jobs_backend_url: "http://scraper:8080/".into(),
            ..Default::default()
        };
        let state = ProxyState::from_config(&config).unwrap();
        assert_eq!(state.jobs_url(), "http://scraper:8080/api/jobs");
    }
}
