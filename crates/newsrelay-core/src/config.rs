use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub ingest: IngestConfig,
    #[serde(default)]
    pub delivery: DeliveryConfig,
    #[serde(default)]
    pub ai: AiConfig,
    #[serde(default)]
    pub telegram: TelegramConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Data directory path
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    /// Log level, used when RUST_LOG is not set
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            log_level: default_log_level(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestConfig {
    /// Seconds between ingestion ticks
    #[serde(default = "default_fetch_interval")]
    pub fetch_interval_secs: u64,
    /// Items whose title or categories contain any of these are dropped
    #[serde(default)]
    pub filter_keywords: Vec<String>,
    /// Upper bound on feeds fetched at the same time within one tick
    #[serde(default = "default_max_concurrent_fetches")]
    pub max_concurrent_fetches: usize,
    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub request_timeout_secs: u64,
    /// HTTP proxy URL for feed fetching, e.g. "http://127.0.0.1:7890" or
    /// "socks5://127.0.0.1:1080"
    #[serde(default)]
    pub proxy_url: Option<String>,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            fetch_interval_secs: default_fetch_interval(),
            filter_keywords: Vec::new(),
            max_concurrent_fetches: default_max_concurrent_fetches(),
            request_timeout_secs: default_timeout(),
            proxy_url: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryConfig {
    /// Seconds between delivery ticks
    #[serde(default = "default_send_interval")]
    pub send_interval_secs: u64,
    /// Maximum article age eligible for delivery; twice the fetch interval when unset
    #[serde(default)]
    pub lookback_secs: Option<u64>,
    /// Timeout for fetching article pages
    #[serde(default = "default_timeout")]
    pub request_timeout_secs: u64,
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            send_interval_secs: default_send_interval(),
            lookback_secs: None,
            request_timeout_secs: default_timeout(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiConfig {
    /// OpenAI API key
    #[serde(default)]
    pub openai_api_key: Option<String>,
    /// OpenAI model name
    #[serde(default = "default_openai_model")]
    pub openai_model: String,
    /// System prompt sent ahead of the article text
    #[serde(default = "default_prompt")]
    pub prompt: String,
    /// Max tokens for summary
    #[serde(default = "default_max_tokens")]
    pub max_summary_tokens: u32,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            openai_api_key: None,
            openai_model: default_openai_model(),
            prompt: default_prompt(),
            max_summary_tokens: default_max_tokens(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramConfig {
    #[serde(default)]
    pub bot_token: Option<String>,
    /// Target channel for published articles
    #[serde(default)]
    pub channel_id: Option<i64>,
    #[serde(default = "default_telegram_api")]
    pub api_base_url: String,
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            bot_token: None,
            channel_id: None,
            api_base_url: default_telegram_api(),
        }
    }
}

fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("newsrelay")
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_fetch_interval() -> u64 {
    600 // 10 minutes
}

fn default_send_interval() -> u64 {
    600
}

fn default_max_concurrent_fetches() -> usize {
    8
}

fn default_timeout() -> u64 {
    30
}

fn default_openai_model() -> String {
    "gpt-3.5-turbo".to_string()
}

fn default_prompt() -> String {
    "You are a news editor. Summarize the following article in 2-3 short sentences. \
Keep the language of the article and focus on the key facts."
        .to_string()
}

fn default_max_tokens() -> u32 {
    256
}

fn default_telegram_api() -> String {
    "https://api.telegram.org".to_string()
}

/// Expand tilde (~) in path to user's home directory
fn expand_tilde(path: &Path) -> PathBuf {
    if let Some(path_str) = path.to_str() {
        if let Some(stripped) = path_str.strip_prefix("~/") {
            if let Some(home) = dirs::home_dir() {
                return home.join(stripped);
            }
        } else if path_str == "~" {
            if let Some(home) = dirs::home_dir() {
                return home;
            }
        }
    }
    path.to_path_buf()
}

impl AppConfig {
    /// Load configuration from a file (defaults when missing), then apply environment overrides
    pub fn load_from(path: &Path) -> crate::Result<Self> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path)?;
            Self::from_toml(&content)?
        } else {
            Self::default()
        };

        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.normalize();
        config.validate()?;

        Ok(config)
    }

    /// Parse configuration from TOML text
    pub fn from_toml(content: &str) -> crate::Result<Self> {
        let mut config: Self =
            toml::from_str(content).map_err(|e| crate::Error::Config(e.to_string()))?;
        config.normalize();
        Ok(config)
    }

    /// Save configuration to file
    pub fn save_to(&self, config_path: &Path) -> crate::Result<()> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)
            .map_err(|e| crate::Error::Config(e.to_string()))?;
        std::fs::write(config_path, content)?;

        Ok(())
    }

    /// Apply overrides from a variable lookup (the process environment in production)
    pub fn apply_overrides<F>(&mut self, lookup: F) -> crate::Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(token) = lookup("NEWSRELAY_TELEGRAM_BOT_TOKEN") {
            self.telegram.bot_token = Some(token);
        }
        if let Some(channel) = lookup("NEWSRELAY_TELEGRAM_CHANNEL_ID") {
            let id = channel.trim().parse::<i64>().map_err(|e| {
                crate::Error::Config(format!("NEWSRELAY_TELEGRAM_CHANNEL_ID: {}", e))
            })?;
            self.telegram.channel_id = Some(id);
        }
        if let Some(key) = lookup("OPENAI_API_KEY") {
            self.ai.openai_api_key = Some(key);
        }
        if let Some(secs) = lookup("NEWSRELAY_FETCH_INTERVAL") {
            self.ingest.fetch_interval_secs = parse_secs("NEWSRELAY_FETCH_INTERVAL", &secs)?;
        }
        if let Some(secs) = lookup("NEWSRELAY_SEND_INTERVAL") {
            self.delivery.send_interval_secs = parse_secs("NEWSRELAY_SEND_INTERVAL", &secs)?;
        }
        if let Some(keywords) = lookup("NEWSRELAY_FILTER_KEYWORDS") {
            self.ingest.filter_keywords = keywords.split(',').map(str::to_string).collect();
        }
        Ok(())
    }

    /// Lower-case and trim filter keywords, dropping empty entries
    fn normalize(&mut self) {
        self.ingest.filter_keywords = self
            .ingest
            .filter_keywords
            .iter()
            .map(|k| k.trim().to_lowercase())
            .filter(|k| !k.is_empty())
            .collect();
    }

    /// Reject settings the schedulers cannot run with
    pub fn validate(&self) -> crate::Result<()> {
        if self.ingest.fetch_interval_secs == 0 {
            return Err(crate::Error::Config("ingest.fetch_interval_secs must be > 0".to_string()));
        }
        if self.delivery.send_interval_secs == 0 {
            return Err(crate::Error::Config("delivery.send_interval_secs must be > 0".to_string()));
        }
        if self.ingest.max_concurrent_fetches == 0 {
            return Err(crate::Error::Config(
                "ingest.max_concurrent_fetches must be > 0".to_string(),
            ));
        }
        Ok(())
    }

    /// Check that everything the delivery side talks to is configured
    pub fn validate_delivery(&self) -> crate::Result<()> {
        if self.telegram.bot_token.as_deref().map_or(true, str::is_empty) {
            return Err(crate::Error::Config("Telegram bot token not configured".to_string()));
        }
        if self.telegram.channel_id.is_none() {
            return Err(crate::Error::Config("Telegram channel id not configured".to_string()));
        }
        if self.ai.openai_api_key.as_deref().map_or(true, str::is_empty) {
            return Err(crate::Error::Config("OpenAI API key not configured".to_string()));
        }
        Ok(())
    }

    pub fn fetch_interval(&self) -> Duration {
        Duration::from_secs(self.ingest.fetch_interval_secs)
    }

    pub fn send_interval(&self) -> Duration {
        Duration::from_secs(self.delivery.send_interval_secs)
    }

    /// Lookback window for delivery selection
    pub fn lookback(&self) -> Duration {
        match self.delivery.lookback_secs {
            Some(secs) => Duration::from_secs(secs),
            None => self.fetch_interval() * 2,
        }
    }

    /// Get the configuration file path
    pub fn config_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".config")
            .join("newsrelay")
            .join("config.toml")
    }

    /// Get the database file path
    pub fn database_path(&self) -> PathBuf {
        self.data_dir().join("newsrelay.db")
    }

    /// Get the data directory (with tilde expansion)
    pub fn data_dir(&self) -> PathBuf {
        expand_tilde(&self.general.data_dir)
    }
}

fn parse_secs(key: &str, value: &str) -> crate::Result<u64> {
    value
        .trim()
        .parse::<u64>()
        .map_err(|e| crate::Error::Config(format!("{}: {}", key, e)))
}
