// Per-panel metric reduction over datasource query frames
use super::errors::ReportError;
use super::panel::PanelDefinition;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesStats {
    pub min: f64,
    pub max: f64,
    pub avg: f64,
    pub count: usize,
    pub latest: f64,
}

impl SeriesStats {
    /// `None` when there are no samples
    pub fn from_samples(samples: &[f64]) -> Option<Self> {
        let latest = *samples.last()?;
        let min = samples.iter().copied().fold(f64::INFINITY, f64::min);
        let max = samples.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let sum: f64 = samples.iter().sum();

        Some(Self {
            min,
            max,
            avg: sum / samples.len() as f64,
            count: samples.len(),
            latest,
        })
    }
}

/// Outcome of reducing one panel's raw result. Serializes to the plain
/// `refId -> stats` mapping, or to `{"error": "..."}` when extraction failed.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum MetricsOutcome {
    Computed(BTreeMap<String, SeriesStats>),
    Failed { error: String },
}

impl MetricsOutcome {
    pub fn is_failed(&self) -> bool {
        matches!(self, MetricsOutcome::Failed { .. })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PanelMetrics {
    pub panel_id: i64,
    pub panel_title: String,
    pub panel_type: String,
    pub metrics: MetricsOutcome,
    pub raw_data: Value,
}

impl PanelMetrics {
    pub fn from_raw(panel: &PanelDefinition, raw_data: Value) -> Self {
        let metrics = extract_metrics(&raw_data, &panel.panel_type);
        Self {
            panel_id: panel.id,
            panel_title: panel.title.clone(),
            panel_type: panel.panel_type.clone(),
            metrics,
            raw_data,
        }
    }
}

/// Reduce a `/api/ds/query` response into per-reference-id statistics.
///
/// Column 0 of each frame holds timestamps and column 1 the samples. Null and
/// non-numeric samples are dropped. When a reference id has several frames the last
/// frame with numeric samples wins. Reference ids without numeric samples are left
/// out. Any shape error discards everything computed so far.
///
/// The panel type is accepted for type-specific policies; the reduction itself is
/// currently the same for every type.
pub fn extract_metrics(raw_data: &Value, _panel_type: &str) -> MetricsOutcome {
    match reduce_results(raw_data) {
        Ok(metrics) => MetricsOutcome::Computed(metrics),
        Err(e) => MetricsOutcome::Failed {
            error: e.to_string(),
        },
    }
}

fn reduce_results(raw_data: &Value) -> Result<BTreeMap<String, SeriesStats>, ReportError> {
    let mut metrics = BTreeMap::new();

    let root = raw_data
        .as_object()
        .ok_or_else(|| ReportError::metric_extraction("query response is not an object"))?;

    let Some(results) = present(root.get("results")) else {
        return Ok(metrics);
    };
    let results = results
        .as_object()
        .ok_or_else(|| ReportError::metric_extraction("'results' is not an object"))?;

    for (ref_id, result) in results {
        let result = result.as_object().ok_or_else(|| {
            ReportError::metric_extraction(format!("result {} is not an object", ref_id))
        })?;

        for frame in array_field(result.get("frames"), ref_id, "frames")? {
            let frame = frame.as_object().ok_or_else(|| {
                ReportError::metric_extraction(format!("frame of {} is not an object", ref_id))
            })?;

            let columns: &[Value] = match present(frame.get("data")) {
                Some(data) => {
                    let data = data.as_object().ok_or_else(|| {
                        ReportError::metric_extraction(format!(
                            "frame data of {} is not an object",
                            ref_id
                        ))
                    })?;
                    array_field(data.get("values"), ref_id, "values")?
                }
                None => &[],
            };

            // Typically [timestamps, values, ...labels]
            if columns.len() < 2 {
                continue;
            }

            let samples: Vec<f64> = array_field(Some(&columns[1]), ref_id, "sample column")?
                .iter()
                .filter_map(Value::as_f64)
                .collect();

            if let Some(stats) = SeriesStats::from_samples(&samples) {
                metrics.insert(ref_id.clone(), stats);
            }
        }
    }

    Ok(metrics)
}

fn present(value: Option<&Value>) -> Option<&Value> {
    value.filter(|v| !v.is_null())
}

fn array_field<'a>(
    value: Option<&'a Value>,
    ref_id: &str,
    name: &str,
) -> Result<&'a [Value], ReportError> {
    match present(value) {
        None => Ok(&[]),
        Some(Value::Array(items)) => Ok(items.as_slice()),
        Some(_) => Err(ReportError::metric_extraction(format!(
            "{} of {} is not an array",
            name, ref_id
        ))),
    }
}
