// Grafana HTTP API repository implementation
use crate::application::monitoring_repository::MonitoringRepository;
use crate::domain::context::DashboardContext;
use crate::domain::panel::DashboardDocument;
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::RequestBuilder;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct GrafanaRepository {
    client: reqwest::Client,
    token: String,
}

/// Body of `POST /api/ds/query`; Grafana expects the bounds as epoch-millisecond strings
#[derive(Debug, Serialize)]
struct DataSourceQueryRequest {
    queries: Vec<Value>,
    from: String,
    to: String,
}

impl GrafanaRepository {
    pub fn new(token: String, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build Grafana HTTP client")?;

        Ok(Self { client, token })
    }

    fn dashboard_url(context: &DashboardContext) -> String {
        format!(
            "{}/api/dashboards/uid/{}",
            context.base_url,
            urlencoding::encode(&context.dashboard_uid)
        )
    }

    fn query_url(context: &DashboardContext) -> String {
        format!("{}/api/ds/query", context.base_url)
    }

    fn authorize(&self, request: RequestBuilder, context: &DashboardContext) -> RequestBuilder {
        request
            .bearer_auth(&self.token)
            .header("Accept", "application/json")
            .header("X-Grafana-Org-Id", &context.org_id)
    }

    async fn execute<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        let response = request
            .send()
            .await
            .context("Failed to send request to Grafana")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Grafana request failed with status {}: {}", status, body);
        }

        response
            .json::<T>()
            .await
            .context("Failed to parse Grafana response")
    }
}

#[async_trait]
impl MonitoringRepository for GrafanaRepository {
    async fn get_dashboard(&self, context: &DashboardContext) -> Result<DashboardDocument> {
        let url = Self::dashboard_url(context);
        tracing::debug!("Fetching dashboard from {}", url);

        let request = self.authorize(self.client.get(&url), context);
        self.execute(request).await
    }

    async fn query_panel_data(&self, context: &DashboardContext, queries: Vec<Value>) -> Result<Value> {
        let payload = DataSourceQueryRequest {
            queries,
            from: context.time_from_ms().to_string(),
            to: context.time_to_ms().to_string(),
        };
        tracing::debug!(
            "Executing {} queries from {} to {}",
            payload.queries.len(),
            payload.from,
            payload.to
        );

        let request = self.authorize(self.client.post(Self::query_url(context)), context).json(&payload);
        self.execute(request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn context(server: &MockServer, uid: &str) -> DashboardContext {
        let url = format!(
            "{}/d/{}/load?orgId=2&from=2025-11-17T21:00:00Z&to=2025-11-17T21:30:00Z",
            server.uri(),
            uid
        );
        DashboardContext::parse(&url).unwrap()
    }

    fn repository() -> GrafanaRepository {
        GrafanaRepository::new("glsa_secret".into(), Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn test_get_dashboard() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/dashboards/uid/abc123"))
            .and(header("authorization", "Bearer glsa_secret"))
            .and(header("x-grafana-org-id", "2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "meta": {"slug": "load"},
                "dashboard": {"title": "Load Test", "panels": [{"id": 1, "type": "graph"}]}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let doc = repository().get_dashboard(&context(&server, "abc123")).await.unwrap();
        assert_eq!(doc.dashboard.title, "Load Test");
        assert_eq!(doc.dashboard.panels.len(), 1);
    }

    #[tokio::test]
    async fn test_query_panel_data_sends_epoch_millis() {
        let server = MockServer::start().await;
        let queries = vec![json!({"refId": "A", "expr": "up", "datasource": {"uid": "prom"}})];
        let response = json!({"results": {"A": {"frames": []}}});

        Mock::given(method("POST"))
            .and(path("/api/ds/query"))
            .and(header("authorization", "Bearer glsa_secret"))
            .and(body_json(json!({
                "queries": queries.clone(),
                "from": "1763413200000",
                "to": "1763415000000"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(response.clone()))
            .expect(1)
            .mount(&server)
            .await;

        let raw = repository()
            .query_panel_data(&context(&server, "abc123"), queries)
            .await
            .unwrap();
        assert_eq!(raw, response);
    }

    #[tokio::test]
    async fn test_error_status_is_reported() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404).set_body_string("Dashboard not found"))
            .mount(&server)
            .await;

        let err = repository()
            .get_dashboard(&context(&server, "missing"))
            .await
            .unwrap_err();
        let message = err.to_string();
        assert!(message.contains("404"), "{}", message);
        assert!(message.contains("Dashboard not found"), "{}", message);
    }
}
