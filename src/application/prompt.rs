// Prompt assembly for the narrative analysis
use crate::domain::metrics::{MetricsOutcome, PanelMetrics};

pub const SYSTEM_PROMPT: &str = "You are a performance testing expert analyzing Grafana dashboard metrics.
Provide a concise executive summary of the performance test results.
Focus on key findings, trends, potential issues, and recommendations.";

/// One block per panel: a `Title (type):` header followed by a line per reference id.
/// Panels whose extraction failed contribute only their header.
pub fn prepare_data_summary(panels: &[PanelMetrics]) -> String {
    let mut lines = Vec::new();

    for panel in panels {
        lines.push(format!("\n{} ({}):", panel.panel_title, panel.panel_type));

        match &panel.metrics {
            MetricsOutcome::Computed(metrics) if metrics.is_empty() => {
                lines.push("  - No metrics available".to_string());
            }
            MetricsOutcome::Computed(metrics) => {
                for (ref_id, stats) in metrics {
                    lines.push(format!(
                        "  - {}: Min={:.2}, Max={:.2}, Avg={:.2}",
                        ref_id, stats.min, stats.max, stats.avg
                    ));
                }
            }
            MetricsOutcome::Failed { .. } => {}
        }
    }

    lines.join("\n")
}

pub fn build_user_prompt(dashboard_title: &str, time_range: &str, data_summary: &str) -> String {
    format!(
        "Analyze the following performance test results:

Dashboard: {dashboard_title}
Time Range: {time_range}

Metrics Summary:
{data_summary}

Please provide:
1. Overall performance assessment
2. Key findings and trends
3. Any concerns or anomalies
4. Recommendations for improvement
"
    )
}
