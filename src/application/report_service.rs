// Report service - Use case for turning a dashboard URL into an analysed report
use crate::application::monitoring_repository::MonitoringRepository;
use crate::application::narrative_generator::NarrativeGenerator;
use crate::application::prompt::{SYSTEM_PROMPT, build_user_prompt, prepare_data_summary};
use crate::domain::context::DashboardContext;
use crate::domain::errors::ReportError;
use crate::domain::metrics::{MetricsOutcome, PanelMetrics};
use crate::domain::panel::{PanelDefinition, flatten_panels};
use crate::domain::variables::substitute_variables;
use serde::Serialize;
use serde_json::{Value, json};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Dashboard variable that overrides every panel's datasource
pub const DATASOURCE_VARIABLE: &str = "data_source";

#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub dashboard_title: String,
    pub dashboard_uid: String,
    pub source_url: String,
    pub time_range: String,
    pub timezone: String,
    pub variables: BTreeMap<String, String>,
    pub panels: Vec<PanelMetrics>,
    pub data_summary: String,
    pub analysis: String,
}

#[derive(Clone)]
pub struct ReportService {
    repository: Arc<dyn MonitoringRepository>,
    narrator: Arc<dyn NarrativeGenerator>,
}

impl ReportService {
    pub fn new(repository: Arc<dyn MonitoringRepository>, narrator: Arc<dyn NarrativeGenerator>) -> Self {
        Self {
            repository,
            narrator,
        }
    }

    pub async fn generate_report(&self, dashboard_url: &str) -> Result<Report, ReportError> {
        let context = DashboardContext::parse(dashboard_url)?;
        let time_range = context.time_range_description();

        tracing::info!("Dashboard: {}", context.dashboard_uid);
        tracing::info!("Time Range: {}", time_range);
        tracing::info!("Variables: {} found", context.variables.len());

        let dashboard = self
            .repository
            .get_dashboard(&context)
            .await
            .map_err(|source| ReportError::DashboardFetch {
                uid: context.dashboard_uid.clone(),
                source,
            })?
            .dashboard;
        tracing::info!("Dashboard title: {}", dashboard.title);

        let panels = flatten_panels(&dashboard.panels);
        tracing::info!("Found {} panels", panels.len());

        let panel_metrics = self.process_panels(&context, &panels).await;

        let data_summary = prepare_data_summary(&panel_metrics);
        let prompt = build_user_prompt(&dashboard.title, &time_range, &data_summary);
        let analysis = self
            .narrator
            .analyze(&prompt, Some(SYSTEM_PROMPT))
            .await
            .map_err(ReportError::Narrative)?;

        Ok(Report {
            dashboard_title: dashboard.title,
            dashboard_uid: context.dashboard_uid,
            source_url: context.raw_url,
            time_range,
            timezone: context.timezone,
            variables: context.variables,
            panels: panel_metrics,
            data_summary,
            analysis,
        })
    }

    /// Panels are processed one at a time; a failing panel is logged and skipped
    async fn process_panels(
        &self,
        context: &DashboardContext,
        panels: &[PanelDefinition],
    ) -> Vec<PanelMetrics> {
        let mut processed = Vec::with_capacity(panels.len());

        for (i, panel) in panels.iter().enumerate() {
            tracing::info!("[{}/{}] {}", i + 1, panels.len(), panel.title);

            match self.process_panel(context, panel).await {
                Ok(metrics) => {
                    if let MetricsOutcome::Failed { error } = &metrics.metrics {
                        tracing::warn!("Could not extract metrics for panel {}: {}", panel.title, error);
                    }
                    processed.push(metrics);
                }
                Err(e) => {
                    tracing::warn!("Failed to process panel: {}", e);
                }
            }
        }

        processed
    }

    async fn process_panel(
        &self,
        context: &DashboardContext,
        panel: &PanelDefinition,
    ) -> Result<PanelMetrics, ReportError> {
        let datasource = resolve_datasource(context, panel);
        let queries = with_datasource(&panel.queries, datasource);
        let queries = substitute_variables(&queries, &context.variables);

        tracing::debug!(
            "Querying panel {} with {} queries against datasource {:?}",
            panel.id,
            queries.len(),
            datasource
        );

        let raw_data = self
            .repository
            .query_panel_data(context, queries)
            .await
            .map_err(|source| ReportError::PanelProcessing {
                panel_id: panel.id,
                title: panel.title.clone(),
                source,
            })?;

        Ok(PanelMetrics::from_raw(panel, raw_data))
    }
}

fn resolve_datasource<'a>(context: &'a DashboardContext, panel: &'a PanelDefinition) -> &'a str {
    context
        .variables
        .get(DATASOURCE_VARIABLE)
        .map(String::as_str)
        .unwrap_or(panel.datasource.as_str())
}

/// Give queries without their own datasource the panel's one
fn with_datasource(queries: &[Value], datasource: &str) -> Vec<Value> {
    queries
        .iter()
        .map(|query| {
            let mut query = query.clone();
            if let Some(fields) = query.as_object_mut() {
                let missing = fields.get("datasource").is_none_or(Value::is_null);
                if missing && !datasource.is_empty() {
                    fields.insert("datasource".to_string(), json!({ "uid": datasource }));
                }
            }
            query
        })
        .collect()
}
