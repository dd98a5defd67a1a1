use async_openai::{
    config::OpenAIConfig,
    types::{
        ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
        ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs,
    },
    Client,
};

use super::{truncate_chars, AiProvider};
use crate::{Error, Result};

/// OpenAI chat completion provider
pub struct OpenAiProvider {
    client: Client<OpenAIConfig>,
    model: String,
    prompt: String,
    max_tokens: u32,
}

impl OpenAiProvider {
    pub fn new(api_key: &str, model: &str, prompt: &str, max_tokens: u32) -> Self {
        let config = OpenAIConfig::new().with_api_key(api_key);
        let client = Client::with_config(config);

        Self {
            client,
            model: model.to_string(),
            prompt: prompt.to_string(),
            max_tokens,
        }
    }

    async fn chat(&self, content: &str) -> Result<String> {
        let system: ChatCompletionRequestMessage = ChatCompletionRequestSystemMessageArgs::default()
            .content(self.prompt.as_str())
            .build()
            .map_err(|e| Error::AiProvider(e.to_string()))?
            .into();
        let user: ChatCompletionRequestMessage = ChatCompletionRequestUserMessageArgs::default()
            .content(content)
            .build()
            .map_err(|e| Error::AiProvider(e.to_string()))?
            .into();

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(vec![system, user])
            .max_tokens(self.max_tokens)
            .temperature(0.7)
            .build()
            .map_err(|e| Error::AiProvider(e.to_string()))?;

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e| Error::AiProvider(e.to_string()))?;

        let content = response
            .choices
            .first()
            .and_then(|c| c.message.content.clone())
            .unwrap_or_default();

        Ok(content)
    }
}

#[async_trait::async_trait]
impl AiProvider for OpenAiProvider {
    async fn summarize(&self, content: &str) -> Result<String> {
        let truncated = truncate_chars(content, self.max_input_chars());
        self.chat(truncated).await
    }
}
