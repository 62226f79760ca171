// HTTP request handlers
use crate::domain::errors::ReportError;
use crate::presentation::app_state::AppState;
use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

#[derive(Deserialize)]
pub struct ReportRequest {
    pub url: String,
}

/// Health check endpoint
pub async fn health_check() -> &'static str {
    "ok"
}

/// Generate a report for the dashboard view in `url`
pub async fn generate_report(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ReportRequest>,
) -> Response {
    match state.report_service.generate_report(&request.url).await {
        Ok(report) => {
            tracing::info!(
                "Report for {} ready with {} panels",
                report.dashboard_uid,
                report.panels.len()
            );
            Json(report).into_response()
        }
        Err(e) => {
            let status = status_for(&e);
            if status.is_client_error() {
                tracing::warn!("Rejected report request: {}", e);
            } else {
                tracing::error!("Report generation failed: {}", e);
            }
            (status, Json(json!({ "error": e.to_string() }))).into_response()
        }
    }
}

fn status_for(error: &ReportError) -> StatusCode {
    match error {
        e if e.is_input_error() => StatusCode::BAD_REQUEST,
        ReportError::DashboardFetch { .. } | ReportError::Narrative(_) => StatusCode::BAD_GATEWAY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}
