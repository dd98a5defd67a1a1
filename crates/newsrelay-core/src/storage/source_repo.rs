use chrono::{DateTime, Utc};
use sqlx::FromRow;
use url::Url;

use super::Database;
use crate::feed::{NewSource, Source};
use crate::{Error, Result};

/// Repository for source CRUD operations
pub struct SourceRepository<'a> {
    db: &'a Database,
}

#[derive(FromRow)]
struct SourceRow {
    id: i64,
    name: String,
    feed_url: String,
    created_at: DateTime<Utc>,
}

impl From<SourceRow> for Source {
    fn from(row: SourceRow) -> Self {
        Source {
            id: row.id,
            name: row.name,
            feed_url: row.feed_url,
            created_at: row.created_at,
        }
    }
}

impl<'a> SourceRepository<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Register a new source, returning it with its assigned id
    pub async fn create(&self, new_source: &NewSource) -> Result<Source> {
        let name = new_source.name.trim();
        if name.is_empty() {
            return Err(Error::Config("Source name must not be empty".to_string()));
        }

        let url = Url::parse(new_source.feed_url.trim())?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(Error::Config(format!(
                "Unsupported feed URL scheme: {}",
                url.scheme()
            )));
        }

        let now = Utc::now();

        let result = sqlx::query(
            r#"
            INSERT INTO sources (name, feed_url, created_at)
            VALUES (?, ?, ?)
            "#,
        )
        .bind(name)
        .bind(url.as_str())
        .bind(now)
        .execute(self.db.pool())
        .await?;

        let id = result.last_insert_rowid();
        self.find_by_id(id).await?.ok_or(Error::SourceNotFound(id))
    }

    /// Find a source by ID
    pub async fn find_by_id(&self, id: i64) -> Result<Option<Source>> {
        let row: Option<SourceRow> = sqlx::query_as(
            r#"
            SELECT id, name, feed_url, created_at
            FROM sources
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(self.db.pool())
        .await?;

        Ok(row.map(Source::from))
    }

    /// Get all configured sources
    pub async fn list_all(&self) -> Result<Vec<Source>> {
        let rows: Vec<SourceRow> = sqlx::query_as(
            r#"
            SELECT id, name, feed_url, created_at
            FROM sources
            ORDER BY id ASC
            "#,
        )
        .fetch_all(self.db.pool())
        .await?;

        Ok(rows.into_iter().map(Source::from).collect())
    }

    /// Delete a source. Its articles are kept.
    pub async fn delete(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM sources WHERE id = ?")
            .bind(id)
            .execute(self.db.pool())
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
