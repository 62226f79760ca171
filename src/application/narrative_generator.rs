// Trait for the language model that writes the narrative analysis
use async_trait::async_trait;

#[async_trait]
pub trait NarrativeGenerator: Send + Sync {
    async fn analyze(&self, prompt: &str, system_prompt: Option<&str>) -> anyhow::Result<String>;
}
