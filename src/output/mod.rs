use crate::dashboard::DashboardView;
use crate::error::Result;
use async_trait::async_trait;

pub mod console;
pub mod json;

#[async_trait]
pub trait DashboardRenderer: Send + Sync {
    async fn render(&mut self, view: &DashboardView) -> Result<()>;
}
