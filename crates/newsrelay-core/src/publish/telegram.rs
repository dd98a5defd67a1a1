use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::Publisher;
use crate::config::AppConfig;
use crate::{Error, Result};

#[derive(Serialize)]
struct SendMessage<'a> {
    chat_id: i64,
    text: &'a str,
    parse_mode: &'static str,
}

#[derive(Deserialize)]
struct ApiResponse {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
}

/// Posts messages through the Telegram Bot API
pub struct TelegramPublisher {
    client: Client,
    endpoint: String,
}

impl TelegramPublisher {
    pub fn new(config: &AppConfig) -> Result<Self> {
        let token = config
            .telegram
            .bot_token
            .as_deref()
            .filter(|token| !token.trim().is_empty())
            .ok_or_else(|| Error::Config("Telegram bot token not configured".to_string()))?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.delivery.request_timeout_secs))
            .build()?;

        let endpoint = format!(
            "{}/bot{}/sendMessage",
            config.telegram.api_base_url.trim_end_matches('/'),
            token
        );

        Ok(Self { client, endpoint })
    }
}

#[async_trait::async_trait]
impl Publisher for TelegramPublisher {
    async fn send(&self, channel_id: i64, text: &str) -> Result<()> {
        let body = SendMessage {
            chat_id: channel_id,
            text,
            parse_mode: "MarkdownV2",
        };

        let response = self.client.post(&self.endpoint).json(&body).send().await?;
        let status = response.status();
        let bytes = response.bytes().await?;

        // Telegram reports failures with ok=false, usually alongside a 4xx status
        match serde_json::from_slice::<ApiResponse>(&bytes) {
            Ok(api) if api.ok => Ok(()),
            Ok(api) => Err(Error::Publish(
                api.description
                    .unwrap_or_else(|| format!("Telegram returned HTTP {}", status)),
            )),
            Err(_) => Err(Error::Publish(format!("Telegram returned HTTP {}", status))),
        }
    }
}
