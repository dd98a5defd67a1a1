use chrono::{DateTime, Utc};
use sqlx::FromRow;

use super::Database;
use crate::feed::{Article, NewArticle};
use crate::Result;

/// Repository for article persistence and delivery bookkeeping
pub struct ArticleRepository<'a> {
    db: &'a Database,
}

#[derive(FromRow)]
struct ArticleRow {
    id: i64,
    source_id: i64,
    title: String,
    link: String,
    summary: Option<String>,
    published_at: DateTime<Utc>,
    posted_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

impl From<ArticleRow> for Article {
    fn from(row: ArticleRow) -> Self {
        Article {
            id: row.id,
            source_id: row.source_id,
            title: row.title,
            link: row.link,
            summary: row.summary,
            published_at: row.published_at,
            posted_at: row.posted_at,
            created_at: row.created_at,
        }
    }
}

impl<'a> ArticleRepository<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Store an article, deduplicated by (source_id, link).
    ///
    /// Returns `true` when a row was created. A duplicate is not an error.
    pub async fn create(&self, article: &NewArticle) -> Result<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO articles (source_id, title, link, summary, published_at, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            ON CONFLICT (source_id, link) DO NOTHING
            "#,
        )
        .bind(article.source_id)
        .bind(&article.title)
        .bind(&article.link)
        .bind(&article.summary)
        .bind(article.published_at)
        .bind(Utc::now())
        .execute(self.db.pool())
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Find an article by ID
    pub async fn find_by_id(&self, id: i64) -> Result<Option<Article>> {
        let row: Option<ArticleRow> = sqlx::query_as(
            r#"
            SELECT id, source_id, title, link, summary, published_at, posted_at, created_at
            FROM articles
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(self.db.pool())
        .await?;

        Ok(row.map(Article::from))
    }

    /// Undelivered articles published at or after `since`, newest first
    pub async fn list_undelivered(&self, since: DateTime<Utc>, limit: u32) -> Result<Vec<Article>> {
        let rows: Vec<ArticleRow> = sqlx::query_as(
            r#"
            SELECT id, source_id, title, link, summary, published_at, posted_at, created_at
            FROM articles
            WHERE posted_at IS NULL AND published_at >= ?
            ORDER BY published_at DESC
            LIMIT ?
            "#,
        )
        .bind(since)
        .bind(limit)
        .fetch_all(self.db.pool())
        .await?;

        Ok(rows.into_iter().map(Article::from).collect())
    }

    /// Count articles still waiting for delivery
    pub async fn count_undelivered(&self) -> Result<i64> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM articles WHERE posted_at IS NULL")
            .fetch_one(self.db.pool())
            .await?;

        Ok(count.0)
    }

    /// Mark an article as delivered. Unknown ids and already delivered
    /// articles are left untouched.
    pub async fn mark_delivered(&self, id: i64) -> Result<()> {
        let now = Utc::now();

        sqlx::query(
            r#"
            UPDATE articles
            SET posted_at = ?
            WHERE id = ? AND posted_at IS NULL
            "#,
        )
        .bind(now)
        .bind(id)
        .execute(self.db.pool())
        .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn new_article(source_id: i64, link: &str, published_at: DateTime<Utc>) -> NewArticle {
        NewArticle {
            source_id,
            title: format!("Title for {}", link),
            link: link.to_string(),
            summary: None,
            published_at,
        }
    }

    #[tokio::test]
    async fn test_store_is_idempotent() {
        let db = Database::new_in_memory().await.unwrap();
        let repo = ArticleRepository::new(&db);
        let article = new_article(1, "https://example.com/a", Utc::now());

        assert!(repo.create(&article).await.unwrap());
        assert!(!repo.create(&article).await.unwrap());

        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM articles")
            .fetch_one(db.pool())
            .await
            .unwrap();
        assert_eq!(count.0, 1);
    }

    #[tokio::test]
    async fn test_same_link_different_source_is_distinct() {
        let db = Database::new_in_memory().await.unwrap();
        let repo = ArticleRepository::new(&db);

        assert!(repo.create(&new_article(1, "https://example.com/a", Utc::now())).await.unwrap());
        assert!(repo.create(&new_article(2, "https://example.com/a", Utc::now())).await.unwrap());
        assert_eq!(repo.count_undelivered().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_list_undelivered_bounds_and_order() {
        let db = Database::new_in_memory().await.unwrap();
        let repo = ArticleRepository::new(&db);
        let now = Utc::now();
        let since = now - Duration::hours(2);

        for (link, published_at) in [
            ("https://example.com/old", now - Duration::hours(3)),
            ("https://example.com/older", now - Duration::hours(1)),
            ("https://example.com/newest", now - Duration::minutes(5)),
            ("https://example.com/posted", now),
        ] {
            repo.create(&new_article(1, link, published_at)).await.unwrap();
        }

        let posted = repo.list_undelivered(since, 10).await.unwrap();
        let posted_id = posted.iter().find(|a| a.link.ends_with("/posted")).unwrap().id;
        repo.mark_delivered(posted_id).await.unwrap();

        let eligible = repo.list_undelivered(since, 10).await.unwrap();
        let links: Vec<&str> = eligible.iter().map(|a| a.link.as_str()).collect();
        assert_eq!(links, vec!["https://example.com/newest", "https://example.com/older"]);

        let top = repo.list_undelivered(since, 1).await.unwrap();
        assert_eq!(top.len(), 1);
        assert_eq!(top[0].link, "https://example.com/newest");
        assert!(top.iter().all(|a| a.posted_at.is_none() && a.published_at >= since));
    }

    #[tokio::test]
    async fn test_mark_delivered() {
        let db = Database::new_in_memory().await.unwrap();
        let repo = ArticleRepository::new(&db);
        repo.create(&new_article(1, "https://example.com/a", Utc::now())).await.unwrap();

        let since = Utc::now() - Duration::hours(1);
        let article = repo.list_undelivered(since, 1).await.unwrap().remove(0);
        repo.mark_delivered(article.id).await.unwrap();

        let stored = repo.find_by_id(article.id).await.unwrap().unwrap();
        let posted_at = stored.posted_at.unwrap();
        assert!(stored.is_delivered());

        // a second mark keeps the original timestamp
        repo.mark_delivered(article.id).await.unwrap();
        let again = repo.find_by_id(article.id).await.unwrap().unwrap();
        assert_eq!(again.posted_at, Some(posted_at));

        // unknown ids are a no-op
        repo.mark_delivered(9999).await.unwrap();
        assert_eq!(repo.count_undelivered().await.unwrap(), 0);
    }
}
