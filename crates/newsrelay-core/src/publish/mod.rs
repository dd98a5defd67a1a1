mod markdown;
mod telegram;

pub use markdown::{escape_markdown, format_message};
pub use telegram::TelegramPublisher;

use crate::Result;

/// Delivers a formatted message to a channel
#[async_trait::async_trait]
pub trait Publisher: Send + Sync {
    async fn send(&self, channel_id: i64, text: &str) -> Result<()>;
}
