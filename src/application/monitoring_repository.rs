// Repository trait for the monitoring backend
use crate::domain::context::DashboardContext;
use crate::domain::panel::DashboardDocument;
use async_trait::async_trait;
use serde_json::Value;

#[async_trait]
pub trait MonitoringRepository: Send + Sync {
    /// Fetch the dashboard model the context points at
    async fn get_dashboard(&self, context: &DashboardContext) -> anyhow::Result<DashboardDocument>;

    /// Execute already-substituted queries over the context's time range and return the
    /// raw response keyed by reference id
    async fn query_panel_data(
        &self,
        context: &DashboardContext,
        queries: Vec<Value>,
    ) -> anyhow::Result<Value>;
}
