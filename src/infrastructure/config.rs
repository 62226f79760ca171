use crate::domain::errors::ReportError;
use serde::Deserialize;

/// Env var names the Grafana service-account token and OpenAI key are read from
pub const GRAFANA_TOKEN_ENV: &str = "SERVICE_ACCOUNT_TOKEN";
pub const OPENAI_API_KEY_ENV: &str = "OPENAI_API_KEY";

#[derive(Debug, Deserialize, Clone, Default)]
pub struct ReportConfig {
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub grafana: GrafanaSettings,
    #[serde(default)]
    pub openai: OpenAiSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerSettings {
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
        }
    }
}

fn default_bind_addr() -> String {
    "0.0.0.0:8080".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct GrafanaSettings {
    pub token: Option<String>,
    #[serde(default = "default_grafana_timeout")]
    pub request_timeout_secs: u64,
}

impl Default for GrafanaSettings {
    fn default() -> Self {
        Self {
            token: None,
            request_timeout_secs: default_grafana_timeout(),
        }
    }
}

fn default_grafana_timeout() -> u64 {
    30
}

#[derive(Debug, Deserialize, Clone)]
pub struct OpenAiSettings {
    pub api_key: Option<String>,
    #[serde(default = "default_openai_base_url")]
    pub base_url: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_temperature")]
    pub temperature: f64,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_openai_timeout")]
    pub request_timeout_secs: u64,
}

impl Default for OpenAiSettings {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_openai_base_url(),
            model: default_model(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            request_timeout_secs: default_openai_timeout(),
        }
    }
}

fn default_openai_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_temperature() -> f64 {
    0.7
}

fn default_max_tokens() -> u32 {
    2000
}

fn default_openai_timeout() -> u64 {
    120
}

/// Secrets checked at startup, before any network call
#[derive(Debug, Clone, PartialEq)]
pub struct Credentials {
    pub grafana_token: String,
    pub openai_api_key: String,
}

impl ReportConfig {
    /// Fails with every missing secret named, not just the first
    pub fn credentials(&self) -> Result<Credentials, ReportError> {
        let present = |value: &Option<String>| value.as_deref().filter(|v| !v.trim().is_empty()).map(str::to_string);

        let grafana_token = present(&self.grafana.token);
        let openai_api_key = present(&self.openai.api_key);

        match (grafana_token, openai_api_key) {
            (Some(grafana_token), Some(openai_api_key)) => Ok(Credentials {
                grafana_token,
                openai_api_key,
            }),
            (grafana_token, openai_api_key) => {
                let mut names = Vec::new();
                if grafana_token.is_none() {
                    names.push(GRAFANA_TOKEN_ENV.to_string());
                }
                if openai_api_key.is_none() {
                    names.push(OPENAI_API_KEY_ENV.to_string());
                }
                Err(ReportError::MissingCredential { names })
            }
        }
    }
}

/// Load `config/report.*` (optional), then `REPORT__SECTION__KEY` variables, then the
/// plain secret variables.
pub fn load_report_config() -> anyhow::Result<ReportConfig> {
    let settings = config::Config::builder()
        .add_source(config::File::with_name("config/report").required(false))
        .add_source(config::Environment::with_prefix("REPORT").separator("__"))
        .set_override_option("grafana.token", std::env::var(GRAFANA_TOKEN_ENV).ok())?
        .set_override_option("openai.api_key", std::env::var(OPENAI_API_KEY_ENV).ok())?
        .build()?;

    Ok(settings.try_deserialize()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::{Config, File, FileFormat};

    fn from_toml(toml: &str) -> ReportConfig {
        Config::builder()
            .add_source(File::from_str(toml, FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap()
    }

    #[test]
    fn test_defaults() {
        let config = from_toml("");
        assert_eq!(config.server.bind_addr, "0.0.0.0:8080");
        assert_eq!(config.grafana.request_timeout_secs, 30);
        assert_eq!(config.openai.model, "gpt-4o-mini");
        assert_eq!(config.openai.base_url, "https://api.openai.com/v1");
        assert_eq!(config.openai.temperature, 0.7);
        assert_eq!(config.openai.max_tokens, 2000);
    }

    #[test]
    fn test_overrides() {
        let config = from_toml(
            r#"
            [grafana]
            token = "glsa_abc"
            request_timeout_secs = 5

            [openai]
            api_key = "sk-test"
            model = "gpt-4o"
            max_tokens = 500
            "#,
        );

        assert_eq!(config.grafana.request_timeout_secs, 5);
        assert_eq!(config.openai.model, "gpt-4o");
        assert_eq!(config.openai.max_tokens, 500);
        assert_eq!(
            config.credentials().unwrap(),
            Credentials {
                grafana_token: "glsa_abc".into(),
                openai_api_key: "sk-test".into(),
            }
        );
    }

    #[test]
    fn test_missing_credentials_are_all_reported() {
        let config = from_toml("[grafana]\ntoken = \"  \"");
        match config.credentials() {
            Err(ReportError::MissingCredential { names }) => {
                assert_eq!(names, vec![GRAFANA_TOKEN_ENV, OPENAI_API_KEY_ENV]);
            }
            other => panic!("expected MissingCredential, got {:?}", other),
        }
    }

    #[test]
    fn test_single_missing_credential() {
        let config = from_toml("[openai]\napi_key = \"sk-test\"");
        match config.credentials() {
            Err(ReportError::MissingCredential { names }) => assert_eq!(names, vec![GRAFANA_TOKEN_ENV]),
            other => panic!("expected MissingCredential, got {:?}", other),
        }
    }
}
