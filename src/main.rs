// Main entry point - Dependency injection and server setup
mod application;
mod domain;
mod infrastructure;
mod presentation;

use std::{net::SocketAddr, sync::Arc, time::Duration};
use axum::{
    Router,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use crate::application::report_service::ReportService;
use crate::infrastructure::config::load_report_config;
use crate::infrastructure::grafana_repository::GrafanaRepository;
use crate::infrastructure::openai_client::OpenAiClient;
use crate::presentation::app_state::AppState;
use crate::presentation::handlers::{generate_report, health_check};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new("dashboard_report=info,tower_http=info")
        }))
        .init();

    // Load configuration; secrets must be present before anything touches the network
    let config = load_report_config()?;
    let credentials = config.credentials()?;

    // Create adapters (infrastructure layer)
    let repository = Arc::new(GrafanaRepository::new(
        credentials.grafana_token,
        Duration::from_secs(config.grafana.request_timeout_secs),
    )?);
    let narrator = Arc::new(OpenAiClient::new(&config.openai, credentials.openai_api_key)?);

    // Create services (application layer)
    let report_service = ReportService::new(repository, narrator);

    let state = Arc::new(AppState { report_service });

    // Build router (presentation layer)
    let router = Router::new()
        .route("/healthz", get(health_check))
        .route("/reports", post(generate_report))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let addr: SocketAddr = config.server.bind_addr.parse()?;
    tracing::info!("Starting dashboard-report service on {}", addr);

    axum::serve(tokio::net::TcpListener::bind(addr).await?, router).await?;

    Ok(())
}
