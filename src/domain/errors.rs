// Error taxonomy for a report run
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReportError {
    /// URL is not absolute or its path is not `/d/<uid>[/<slug>]`
    #[error("Invalid dashboard URL format: {path}")]
    MalformedUrl { path: String },

    /// `from`/`to` missing, unparseable or out of order
    #[error("Invalid time range value {raw:?}: {reason}")]
    InvalidTimeRange { raw: String, reason: String },

    /// Required secrets absent at startup
    #[error("Missing required credentials: {}", names.join(", "))]
    MissingCredential { names: Vec<String> },

    /// One panel could not be fetched; the run continues without it
    #[error("Failed to process panel {panel_id} ({title}): {source:#}")]
    PanelProcessing {
        panel_id: i64,
        title: String,
        #[source]
        source: anyhow::Error,
    },

    /// Raw result had an unexpected shape
    #[error("{message}")]
    MetricExtraction { message: String },

    #[error("Failed to fetch dashboard {uid}: {source:#}")]
    DashboardFetch {
        uid: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("Failed to generate narrative analysis: {0:#}")]
    Narrative(#[source] anyhow::Error),
}

impl ReportError {
    pub fn metric_extraction(message: impl Into<String>) -> Self {
        ReportError::MetricExtraction {
            message: message.into(),
        }
    }

    /// Errors caused by the caller's input rather than a collaborator
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            ReportError::MalformedUrl { .. } | ReportError::InvalidTimeRange { .. }
        )
    }
}
