use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinSet;

use super::service::PeriodicTask;
use crate::config::AppConfig;
use crate::feed::{should_skip, FeedClient, NewArticle, Source};
use crate::storage::{ArticleStore, SourceStore};
use crate::{Error, Result};

/// Totals for one ingestion tick
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestReport {
    pub sources: usize,
    pub failed_sources: usize,
    pub items: usize,
    pub skipped: usize,
    pub stored: usize,
}

#[derive(Debug, Default)]
struct SourceStats {
    items: usize,
    skipped: usize,
    stored: usize,
}

/// Fetches every source, filters items and stores the survivors
pub struct IngestPipeline {
    sources: Arc<dyn SourceStore>,
    articles: Arc<dyn ArticleStore>,
    client: Arc<dyn FeedClient>,
    keywords: Arc<[String]>,
    concurrency: usize,
    interval: Duration,
}

impl IngestPipeline {
    pub fn new(
        config: &AppConfig,
        sources: Arc<dyn SourceStore>,
        articles: Arc<dyn ArticleStore>,
        client: Arc<dyn FeedClient>,
    ) -> Self {
        Self {
            sources,
            articles,
            client,
            keywords: config.ingest.filter_keywords.clone().into(),
            concurrency: config.ingest.max_concurrent_fetches.max(1),
            interval: config.fetch_interval(),
        }
    }

    /// Run one ingestion pass over all sources.
    ///
    /// A failing source is logged and does not affect the others. Only a
    /// failure to list sources is returned as an error.
    pub async fn run_once(&self, shutdown: watch::Receiver<bool>) -> Result<IngestReport> {
        if *shutdown.borrow() {
            return Err(Error::Cancelled);
        }

        let sources = self.sources.sources().await?;
        let mut report = IngestReport {
            sources: sources.len(),
            ..Default::default()
        };

        if sources.is_empty() {
            tracing::debug!("No sources configured");
            return Ok(report);
        }

        let mut cancelled = false;
        let mut join_set: JoinSet<(String, Result<SourceStats>)> = JoinSet::new();
        let mut pending = sources.into_iter();

        for _ in 0..self.concurrency {
            if let Some(source) = pending.next() {
                self.spawn_source(&mut join_set, source, shutdown.clone());
            }
        }

        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok((_, Ok(stats))) => {
                    report.items += stats.items;
                    report.skipped += stats.skipped;
                    report.stored += stats.stored;
                }
                Ok((_, Err(Error::Cancelled))) => cancelled = true,
                Ok((name, Err(e @ Error::Database(_)))) => {
                    tracing::error!("Failed to store items from '{}': {}", name, e);
                    report.failed_sources += 1;
                }
                Ok((name, Err(e))) => {
                    tracing::warn!("Failed to fetch source '{}': {}", name, e);
                    report.failed_sources += 1;
                }
                Err(e) => {
                    tracing::error!("Ingestion task failed: {}", e);
                    report.failed_sources += 1;
                }
            }

            if !cancelled {
                if let Some(source) = pending.next() {
                    self.spawn_source(&mut join_set, source, shutdown.clone());
                }
            }
        }

        if cancelled {
            return Err(Error::Cancelled);
        }

        Ok(report)
    }

    fn spawn_source(
        &self,
        join_set: &mut JoinSet<(String, Result<SourceStats>)>,
        source: Source,
        shutdown: watch::Receiver<bool>,
    ) {
        let client = Arc::clone(&self.client);
        let articles = Arc::clone(&self.articles);
        let keywords = Arc::clone(&self.keywords);

        join_set.spawn(async move {
            let result = process_source(
                &source,
                client.as_ref(),
                articles.as_ref(),
                &keywords,
                shutdown,
            )
            .await;
            (source.name, result)
        });
    }
}

/// Fetch one source and store its items. The first store error ends the
/// source's pass.
async fn process_source(
    source: &Source,
    client: &dyn FeedClient,
    articles: &dyn ArticleStore,
    keywords: &[String],
    shutdown: watch::Receiver<bool>,
) -> Result<SourceStats> {
    let items = client.fetch(&source.feed_url, &source.name, shutdown).await?;
    let mut stats = SourceStats {
        items: items.len(),
        ..Default::default()
    };

    for item in items {
        if should_skip(&item, keywords) {
            tracing::debug!("Skipping '{}' from '{}'", item.title, source.name);
            stats.skipped += 1;
            continue;
        }

        if articles.store(&NewArticle::from_item(source.id, item)).await? {
            stats.stored += 1;
        }
    }

    tracing::debug!(
        "Source '{}': {} items, {} skipped, {} new",
        source.name,
        stats.items,
        stats.skipped,
        stats.stored
    );

    Ok(stats)
}

#[async_trait::async_trait]
impl PeriodicTask for IngestPipeline {
    fn name(&self) -> &'static str {
        "ingest"
    }

    fn period(&self) -> Duration {
        self.interval
    }

    async fn tick(&self, shutdown: watch::Receiver<bool>) -> Result<()> {
        let report = self.run_once(shutdown).await?;
        tracing::info!(
            "Ingested {} sources ({} failed): {} items, {} skipped, {} new",
            report.sources,
            report.failed_sources,
            report.items,
            report.skipped,
            report.stored
        );
        Ok(())
    }
}
