// Dashboard context parsed from a Grafana dashboard URL
use super::errors::ReportError;
use chrono::{DateTime, FixedOffset};
use std::collections::BTreeMap;
use url::Url;

const DASHBOARD_MARKER: &str = "d";
const VARIABLE_PREFIX: &str = "var-";
const DEFAULT_ORG_ID: &str = "1";
const DEFAULT_TIMEZONE: &str = "browser";

/// Everything a report run needs to know about the dashboard view the URL points at.
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardContext {
    pub base_url: String,
    pub dashboard_uid: String,
    pub org_id: String,
    pub time_from: DateTime<FixedOffset>,
    pub time_to: DateTime<FixedOffset>,
    pub timezone: String,
    pub variables: BTreeMap<String, String>,
    pub raw_url: String,
}

impl DashboardContext {
    /// Parse a dashboard URL such as
    /// `http://grafana:3000/d/abc123/my-dash?from=2025-11-17T21:54:08.137Z&to=...&var-env=prod`.
    pub fn parse(dashboard_url: &str) -> Result<Self, ReportError> {
        let parsed = Url::parse(dashboard_url).map_err(|_| ReportError::MalformedUrl {
            path: dashboard_url.to_string(),
        })?;

        let base_url = base_url_of(&parsed).ok_or_else(|| ReportError::MalformedUrl {
            path: dashboard_url.to_string(),
        })?;
        let dashboard_uid = dashboard_uid_of(parsed.path())?;

        // Repeated keys keep their first value
        let mut params: Vec<(String, String)> = Vec::new();
        for (key, value) in parsed.query_pairs() {
            if !params.iter().any(|(k, _)| *k == key) {
                params.push((key.into_owned(), value.into_owned()));
            }
        }
        let param = |name: &str| {
            params
                .iter()
                .find(|(k, _)| k == name)
                .map(|(_, v)| v.as_str())
        };

        let time_from = parse_time(param("from").unwrap_or_default())?;
        let time_to = parse_time(param("to").unwrap_or_default())?;
        if time_to < time_from {
            return Err(ReportError::InvalidTimeRange {
                raw: param("to").unwrap_or_default().to_string(),
                reason: "time range ends before it starts".to_string(),
            });
        }

        let org_id = param("orgId").unwrap_or(DEFAULT_ORG_ID).to_string();
        let timezone = param("timezone").unwrap_or(DEFAULT_TIMEZONE).to_string();

        let variables = params
            .iter()
            .filter_map(|(key, value)| {
                key.strip_prefix(VARIABLE_PREFIX)
                    .map(|name| (name.to_string(), value.clone()))
            })
            .collect();

        Ok(Self {
            base_url,
            dashboard_uid,
            org_id,
            time_from,
            time_to,
            timezone,
            variables,
            raw_url: dashboard_url.to_string(),
        })
    }

    pub fn time_from_ms(&self) -> i64 {
        self.time_from.timestamp_millis()
    }

    pub fn time_to_ms(&self) -> i64 {
        self.time_to.timestamp_millis()
    }

    /// Human-readable span, e.g. `1.5 hours (2025-11-17 21:00 to 2025-11-17 22:30)`
    pub fn time_range_description(&self) -> String {
        let seconds = (self.time_to - self.time_from).num_milliseconds() as f64 / 1000.0;
        let hours = seconds / 3600.0;

        if hours >= 1.0 {
            format!(
                "{:.1} hours ({} to {})",
                hours,
                self.time_from.format("%Y-%m-%d %H:%M"),
                self.time_to.format("%Y-%m-%d %H:%M")
            )
        } else {
            let minutes = (seconds % 3600.0) / 60.0;
            format!(
                "{:.0} minutes ({} to {})",
                minutes,
                self.time_from.format("%H:%M:%S"),
                self.time_to.format("%H:%M:%S")
            )
        }
    }
}

fn base_url_of(url: &Url) -> Option<String> {
    let host = url.host_str()?;
    Some(match url.port() {
        Some(port) => format!("{}://{}:{}", url.scheme(), host, port),
        None => format!("{}://{}", url.scheme(), host),
    })
}

fn dashboard_uid_of(path: &str) -> Result<String, ReportError> {
    let parts: Vec<&str> = path.trim_matches('/').split('/').collect();
    match parts.as_slice() {
        [marker, uid, ..] if *marker == DASHBOARD_MARKER && !uid.is_empty() => Ok(uid.to_string()),
        _ => Err(ReportError::MalformedUrl {
            path: path.to_string(),
        }),
    }
}

/// Parse an ISO-8601 timestamp with an explicit offset; a trailing `Z` means UTC.
fn parse_time(raw: &str) -> Result<DateTime<FixedOffset>, ReportError> {
    if raw.is_empty() {
        return Err(ReportError::InvalidTimeRange {
            raw: raw.to_string(),
            reason: "time parameter is missing".to_string(),
        });
    }

    let normalized = match raw.strip_suffix('Z') {
        Some(stripped) => format!("{}+00:00", stripped),
        None => raw.to_string(),
    };

    DateTime::parse_from_rfc3339(&normalized)
        .or_else(|_| DateTime::parse_from_str(&normalized, "%Y-%m-%dT%H:%M%:z"))
        .map_err(|e| ReportError::InvalidTimeRange {
            raw: raw.to_string(),
            reason: format!("unsupported time format ({})", e),
        })
}
