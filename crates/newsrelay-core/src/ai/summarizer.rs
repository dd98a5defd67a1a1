use std::sync::Arc;

use super::providers::{AiProvider, OpenAiProvider};
use crate::config::AppConfig;
use crate::{Error, Result};

/// AI Summarizer that wraps the configured provider
#[derive(Clone)]
pub struct Summarizer {
    provider: Arc<dyn AiProvider>,
}

impl Summarizer {
    /// Create a new summarizer based on configuration
    pub fn new(config: &AppConfig) -> Result<Self> {
        let api_key = config
            .ai
            .openai_api_key
            .as_deref()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| Error::Config("OpenAI API key not configured".to_string()))?;

        let provider = OpenAiProvider::new(
            api_key,
            &config.ai.openai_model,
            &config.ai.prompt,
            config.ai.max_summary_tokens.max(1),
        );

        Ok(Self::with_provider(Arc::new(provider)))
    }

    pub fn with_provider(provider: Arc<dyn AiProvider>) -> Self {
        Self { provider }
    }

    /// Generate a summary for article text. An empty answer is an error.
    pub async fn summarize(&self, content: &str) -> Result<String> {
        let summary = self.provider.summarize(content).await?;
        let summary = summary.trim();

        if summary.is_empty() {
            return Err(Error::AiProvider("Provider returned an empty summary".to_string()));
        }

        Ok(summary.to_string())
    }
}
