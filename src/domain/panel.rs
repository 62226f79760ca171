// Dashboard and panel domain models
use serde::Deserialize;
use serde_json::Value;

const ROW_PANEL_TYPE: &str = "row";
const UNTITLED: &str = "Untitled";
const UNKNOWN_TYPE: &str = "unknown";

/// Response of `GET /api/dashboards/uid/{uid}`
#[derive(Debug, Clone, Deserialize)]
pub struct DashboardDocument {
    pub dashboard: DashboardModel,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DashboardModel {
    pub title: String,
    #[serde(default)]
    pub panels: Vec<Value>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PanelDefinition {
    pub id: i64,
    pub title: String,
    pub panel_type: String,
    pub datasource: String,
    pub queries: Vec<Value>,
}

impl PanelDefinition {
    /// Build from a raw panel object, falling back to defaults for missing fields
    pub fn from_json(panel: &Value) -> Self {
        let str_field = |name: &str, default: &str| {
            panel
                .get(name)
                .and_then(Value::as_str)
                .unwrap_or(default)
                .to_string()
        };

        Self {
            id: panel.get("id").and_then(Value::as_i64).unwrap_or(0),
            title: str_field("title", UNTITLED),
            panel_type: str_field("type", UNKNOWN_TYPE),
            datasource: datasource_uid(panel.get("datasource")),
            queries: panel
                .get("targets")
                .and_then(Value::as_array)
                .cloned()
                .unwrap_or_default(),
        }
    }
}

// Newer dashboards reference `{"type": ..., "uid": ...}`, older ones a bare name
fn datasource_uid(datasource: Option<&Value>) -> String {
    match datasource {
        Some(Value::Object(ds)) => ds
            .get("uid")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        Some(Value::String(name)) => name.clone(),
        _ => String::new(),
    }
}

/// Flatten a panel tree into display order. Row containers are replaced by their
/// children (one level deep) and never emitted themselves.
pub fn flatten_panels(panels: &[Value]) -> Vec<PanelDefinition> {
    let mut flat = Vec::new();

    for panel in panels {
        if panel.get("type").and_then(Value::as_str) == Some(ROW_PANEL_TYPE) {
            if let Some(children) = panel.get("panels").and_then(Value::as_array) {
                flat.extend(children.iter().map(PanelDefinition::from_json));
            }
        } else {
            flat.push(PanelDefinition::from_json(panel));
        }
    }

    flat
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_flatten_row_with_children() {
        let panels = vec![
            json!({"id": 1, "title": "Sibling", "type": "stat"}),
            json!({"id": 2, "title": "Row", "type": "row", "panels": [
                {"id": 3, "title": "Child A", "type": "timeseries"},
                {"id": 4, "title": "Child B", "type": "graph"},
            ]}),
        ];

        let flat = flatten_panels(&panels);
        let ids: Vec<i64> = flat.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![1, 3, 4]);
        assert_eq!(flat[0].title, "Sibling");
    }

    #[test]
    fn test_sibling_after_row_keeps_source_order() {
        let panels = vec![
            json!({"id": 2, "type": "row", "panels": [{"id": 3}, {"id": 4}]}),
            json!({"id": 1, "type": "stat"}),
        ];
        let ids: Vec<i64> = flatten_panels(&panels).iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![3, 4, 1]);
    }

    #[test]
    fn test_expanded_row_without_children_is_dropped() {
        let panels = vec![
            json!({"id": 10, "type": "row", "panels": []}),
            json!({"id": 11, "type": "row"}),
            json!({"id": 12, "type": "table"}),
        ];
        let ids: Vec<i64> = flatten_panels(&panels).iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![12]);
    }

    #[test]
    fn test_fallback_values() {
        let panel = PanelDefinition::from_json(&json!({}));
        assert_eq!(
            panel,
            PanelDefinition {
                id: 0,
                title: "Untitled".into(),
                panel_type: "unknown".into(),
                datasource: String::new(),
                queries: vec![],
            }
        );
    }

    #[test]
    fn test_datasource_shapes() {
        let object = PanelDefinition::from_json(&json!({
            "datasource": {"type": "prometheus", "uid": "PBFA97CFB590B2093"},
            "targets": [{"refId": "A", "expr": "up"}]
        }));
        assert_eq!(object.datasource, "PBFA97CFB590B2093");
        assert_eq!(object.queries, vec![json!({"refId": "A", "expr": "up"})]);

        let legacy = PanelDefinition::from_json(&json!({"datasource": "Prometheus"}));
        assert_eq!(legacy.datasource, "Prometheus");

        let missing_uid = PanelDefinition::from_json(&json!({"datasource": {"type": "loki"}}));
        assert_eq!(missing_uid.datasource, "");
    }

    #[test]
    fn test_dashboard_document_deserializes() {
        let doc: DashboardDocument = serde_json::from_value(json!({
            "meta": {"slug": "load-test"},
            "dashboard": {"title": "Load Test", "panels": [{"id": 1}]}
        }))
        .unwrap();
        assert_eq!(doc.dashboard.title, "Load Test");
        assert_eq!(flatten_panels(&doc.dashboard.panels).len(), 1);
    }
}
