// Template variable substitution for datasource query payloads
use regex::{Captures, Regex};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::LazyLock;

/// Variable value Grafana uses for "All" selections
pub const MATCH_ALL_SENTINEL: &str = "$__all";

/// Replacement for a braced placeholder whose value is the "All" sentinel
pub const MATCH_EVERYTHING_REGEX: &str = ".*";

// `${name}` or `$name`; the identifier is always taken whole
static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$\{([A-Za-z0-9_]+)\}|\$([A-Za-z0-9_]+)").expect("placeholder pattern is valid")
});

/// Replace variable placeholders in every string leaf of the given query payloads.
///
/// Each string is scanned once, so substituted values are never re-expanded and a
/// variable whose name is a prefix of another (`env` / `environment`) cannot match
/// inside the longer placeholder. Placeholders without a matching variable are kept
/// verbatim.
pub fn substitute_variables(queries: &[Value], vars: &BTreeMap<String, String>) -> Vec<Value> {
    queries.iter().map(|query| substitute_value(query, vars)).collect()
}

fn substitute_value(value: &Value, vars: &BTreeMap<String, String>) -> Value {
    match value {
        Value::String(s) => Value::String(substitute_str(s, vars)),
        Value::Array(items) => Value::Array(items.iter().map(|v| substitute_value(v, vars)).collect()),
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), substitute_value(v, vars)))
                .collect(),
        ),
        other => other.clone(),
    }
}

pub fn substitute_str(input: &str, vars: &BTreeMap<String, String>) -> String {
    if vars.is_empty() || !input.contains('$') {
        return input.to_string();
    }

    PLACEHOLDER
        .replace_all(input, |caps: &Captures| {
            let (name, braced) = match (caps.get(1), caps.get(2)) {
                (Some(name), _) => (name.as_str(), true),
                (None, Some(name)) => (name.as_str(), false),
                (None, None) => return caps[0].to_string(),
            };

            match vars.get(name) {
                Some(value) if braced && value == MATCH_ALL_SENTINEL => {
                    MATCH_EVERYTHING_REGEX.to_string()
                }
                Some(value) => value.clone(),
                None => caps[0].to_string(),
            }
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn vars(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_braced_and_bare_forms() {
        let vars = vars(&[("env", "prod")]);
        let queries = vec![json!({
            "refId": "A",
            "expr": "up{env=\"${env}\"} or up{stage=\"$env\"}"
        })];

        let result = substitute_variables(&queries, &vars);
        assert_eq!(
            result[0]["expr"],
            json!("up{env=\"prod\"} or up{stage=\"prod\"}")
        );
        assert_eq!(result[0]["refId"], json!("A"));
    }

    #[test]
    fn test_match_all_sentinel_braced_becomes_regex() {
        let vars = vars(&[("host", MATCH_ALL_SENTINEL)]);
        let result = substitute_str("up{host=~\"${host}\"}", &vars);
        assert_eq!(result, "up{host=~\".*\"}");
        assert!(!result.contains(MATCH_ALL_SENTINEL));
    }

    #[test]
    fn test_match_all_sentinel_bare_form_keeps_value() {
        let vars = vars(&[("host", MATCH_ALL_SENTINEL)]);
        assert_eq!(substitute_str("host=$host", &vars), "host=$__all");
    }

    #[test]
    fn test_prefix_names_do_not_collide() {
        let vars = vars(&[("env", "prod"), ("environment", "eu-west")]);
        assert_eq!(
            substitute_str("$environment/$env/${environment}/${env}", &vars),
            "eu-west/prod/eu-west/prod"
        );
    }

    #[test]
    fn test_unknown_placeholders_are_left_intact() {
        let vars = vars(&[("env", "prod")]);
        assert_eq!(
            substitute_str("rate(x[$__rate_interval]) ${missing} $env", &vars),
            "rate(x[$__rate_interval]) ${missing} prod"
        );
    }

    #[test]
    fn test_nested_structures_and_keys() {
        let vars = vars(&[("ds", "P123"), ("job", "api")]);
        let queries = vec![json!({
            "$job": "key stays",
            "datasource": {"uid": "${ds}"},
            "filters": [{"value": "$job"}, 42, null, true],
        })];

        let result = substitute_variables(&queries, &vars);
        assert_eq!(
            result[0],
            json!({
                "$job": "key stays",
                "datasource": {"uid": "P123"},
                "filters": [{"value": "api"}, 42, null, true],
            })
        );
    }

    #[test]
    fn test_values_are_not_re_expanded() {
        let vars = vars(&[("a", "$b"), ("b", "boom")]);
        assert_eq!(substitute_str("${a}", &vars), "$b");
    }

    #[test]
    fn test_substitution_is_idempotent() {
        let vars = vars(&[("env", "prod"), ("host", MATCH_ALL_SENTINEL)]);
        let queries = vec![
            json!({"expr": "up{env=\"$env\", host=~\"${host}\"}"}),
            json!({"query": "SELECT * FROM t WHERE env = '${env}'"}),
        ];

        let once = substitute_variables(&queries, &vars);
        let twice = substitute_variables(&once, &vars);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_order_is_preserved() {
        let vars = vars(&[("x", "1")]);
        let queries = vec![json!({"refId": "A"}), json!({"refId": "B"}), json!("$x")];
        let result = substitute_variables(&queries, &vars);
        assert_eq!(result, vec![json!({"refId": "A"}), json!({"refId": "B"}), json!("1")]);
    }
}
