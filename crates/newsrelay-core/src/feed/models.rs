use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A configured feed endpoint that ingestion polls
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Source {
    pub id: i64,
    pub name: String,
    pub feed_url: String,
    pub created_at: DateTime<Utc>,
}

/// Data required to register a new source
#[derive(Debug, Clone)]
pub struct NewSource {
    pub name: String,
    pub feed_url: String,
}

/// One entry parsed out of a feed response. Never persisted as-is.
#[derive(Debug, Clone)]
pub struct Item {
    pub title: String,
    pub categories: Vec<String>,
    pub link: String,
    pub published_at: DateTime<Utc>,
    /// Summary carried by the feed itself, if any
    pub summary: Option<String>,
    pub source_name: String,
}

/// Durable article record derived from an [`Item`]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Article {
    pub id: i64,
    pub source_id: i64,
    pub title: String,
    pub link: String,
    pub summary: Option<String>,
    pub published_at: DateTime<Utc>,
    /// Set once the article has been published to the channel
    pub posted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Data required to store a new article
#[derive(Debug, Clone)]
pub struct NewArticle {
    pub source_id: i64,
    pub title: String,
    pub link: String,
    pub summary: Option<String>,
    pub published_at: DateTime<Utc>,
}

impl NewArticle {
    pub fn from_item(source_id: i64, item: Item) -> Self {
        Self {
            source_id,
            title: item.title,
            link: item.link,
            summary: item.summary,
            published_at: item.published_at,
        }
    }
}

impl Article {
    pub fn is_delivered(&self) -> bool {
        self.posted_at.is_some()
    }

    /// Inline summary supplied by the feed, ignoring blank ones
    pub fn inline_summary(&self) -> Option<&str> {
        self.summary.as_deref().filter(|s| !s.trim().is_empty())
    }
}
