use chrono::{DateTime, Utc};

use super::{ArticleRepository, Database, SourceRepository};
use crate::feed::{Article, NewArticle, Source};
use crate::Result;

/// Read access to configured sources, as needed by ingestion
#[async_trait::async_trait]
pub trait SourceStore: Send + Sync {
    async fn sources(&self) -> Result<Vec<Source>>;
}

/// Article persistence shared by the ingestion and delivery pipelines
#[async_trait::async_trait]
pub trait ArticleStore: Send + Sync {
    /// Idempotent insert; returns whether a new row was created
    async fn store(&self, article: &NewArticle) -> Result<bool>;

    /// Undelivered articles published at or after `since`, newest first
    async fn list_undelivered(&self, since: DateTime<Utc>, limit: u32) -> Result<Vec<Article>>;

    async fn mark_delivered(&self, id: i64) -> Result<()>;
}

#[async_trait::async_trait]
impl SourceStore for Database {
    async fn sources(&self) -> Result<Vec<Source>> {
        SourceRepository::new(self).list_all().await
    }
}

#[async_trait::async_trait]
impl ArticleStore for Database {
    async fn store(&self, article: &NewArticle) -> Result<bool> {
        ArticleRepository::new(self).create(article).await
    }

    async fn list_undelivered(&self, since: DateTime<Utc>, limit: u32) -> Result<Vec<Article>> {
        ArticleRepository::new(self).list_undelivered(since, limit).await
    }

    async fn mark_delivered(&self, id: i64) -> Result<()> {
        ArticleRepository::new(self).mark_delivered(id).await
    }
}
