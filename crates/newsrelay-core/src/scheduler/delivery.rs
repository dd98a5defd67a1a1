use std::sync::Arc;
use std::time::Duration;

use chrono::{TimeDelta, Utc};
use tokio::sync::watch;

use super::service::PeriodicTask;
use super::shutdown::wait_for_shutdown;
use crate::ai::Summarizer;
use crate::config::AppConfig;
use crate::content::ContentExtractor;
use crate::feed::Article;
use crate::publish::{format_message, Publisher};
use crate::storage::ArticleStore;
use crate::{Error, Result};

/// Result of one delivery tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryOutcome {
    /// Nothing eligible inside the lookback window
    Idle,
    /// The article was published and marked delivered
    Delivered(i64),
    /// A step after selection failed; the article stays undelivered
    Deferred(i64),
}

/// Publishes at most one undelivered article per tick
pub struct DeliveryPipeline {
    articles: Arc<dyn ArticleStore>,
    extractor: ContentExtractor,
    summarizer: Summarizer,
    publisher: Arc<dyn Publisher>,
    channel_id: i64,
    lookback: TimeDelta,
    interval: Duration,
}

impl DeliveryPipeline {
    pub fn new(
        config: &AppConfig,
        articles: Arc<dyn ArticleStore>,
        extractor: ContentExtractor,
        summarizer: Summarizer,
        publisher: Arc<dyn Publisher>,
    ) -> Result<Self> {
        let channel_id = config
            .telegram
            .channel_id
            .ok_or_else(|| Error::Config("Telegram channel id not configured".to_string()))?;
        let lookback = TimeDelta::from_std(config.lookback())
            .map_err(|e| Error::Config(format!("Invalid lookback window: {}", e)))?;

        Ok(Self {
            articles,
            extractor,
            summarizer,
            publisher,
            channel_id,
            lookback,
            interval: config.send_interval(),
        })
    }

    /// Select the newest undelivered article and publish it.
    ///
    /// Only a failed selection is returned as an error. Failures after that
    /// leave the article undelivered for the next tick.
    pub async fn run_once(&self, mut shutdown: watch::Receiver<bool>) -> Result<DeliveryOutcome> {
        if *shutdown.borrow() {
            return Err(Error::Cancelled);
        }

        let since = Utc::now() - self.lookback;
        let Some(article) = self.articles.list_undelivered(since, 1).await?.pop() else {
            tracing::debug!("No undelivered articles since {}", since);
            return Ok(DeliveryOutcome::Idle);
        };

        let summary = tokio::select! {
            _ = wait_for_shutdown(&mut shutdown) => return Err(Error::Cancelled),
            result = self.summarize(&article) => result,
        };
        let summary = match summary {
            Ok(summary) => summary,
            Err(e) => {
                tracing::warn!(
                    "Failed to summarize article {} ({}): {}",
                    article.id,
                    article.link,
                    e
                );
                return Ok(DeliveryOutcome::Deferred(article.id));
            }
        };

        let message = format_message(&article.title, &summary, &article.link);
        if let Err(e) = self.publisher.send(self.channel_id, &message).await {
            tracing::warn!("Failed to publish article {}: {}", article.id, e);
            return Ok(DeliveryOutcome::Deferred(article.id));
        }

        // the message is already out; a failure here means a repeat post later
        if let Err(e) = self.articles.mark_delivered(article.id).await {
            tracing::warn!(
                "Published article {} but could not mark it delivered: {}",
                article.id,
                e
            );
            return Ok(DeliveryOutcome::Deferred(article.id));
        }

        tracing::info!("Delivered article {}: {}", article.id, article.title);
        Ok(DeliveryOutcome::Delivered(article.id))
    }

    async fn summarize(&self, article: &Article) -> Result<String> {
        let text = self.extractor.extract(article).await?;
        self.summarizer.summarize(&text).await
    }
}

#[async_trait::async_trait]
impl PeriodicTask for DeliveryPipeline {
    fn name(&self) -> &'static str {
        "delivery"
    }

    fn period(&self) -> Duration {
        self.interval
    }

    async fn tick(&self, shutdown: watch::Receiver<bool>) -> Result<()> {
        match self.run_once(shutdown).await? {
            DeliveryOutcome::Deferred(id) => tracing::info!("Article {} deferred to next tick", id),
            DeliveryOutcome::Idle | DeliveryOutcome::Delivered(_) => {}
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::AiProvider;
    use crate::scheduler::run_periodic;
    use crate::feed::NewArticle;
    use crate::storage::{ArticleRepository, Database};
    use chrono::{DateTime, Duration as ChronoDuration};
    use std::sync::Mutex;

    enum Reply {
        Text(&'static str),
        Fail,
        Hang,
    }

    struct MockProvider(Reply);

    #[async_trait::async_trait]
    impl AiProvider for MockProvider {
        async fn summarize(&self, _content: &str) -> Result<String> {
            match self.0 {
                Reply::Text(text) => Ok(text.to_string()),
                Reply::Fail => Err(Error::AiProvider("rate limited".to_string())),
                Reply::Hang => std::future::pending().await,
            }
        }
    }

    #[derive(Default)]
    struct MockPublisher {
        sent: Mutex<Vec<(i64, String)>>,
        fail: bool,
    }

    impl MockPublisher {
        fn sent(&self) -> Vec<(i64, String)> {
            self.sent.lock().unwrap().clone()
        }
    }

    #[async_trait::async_trait]
    impl Publisher for MockPublisher {
        async fn send(&self, channel_id: i64, text: &str) -> Result<()> {
            if self.fail {
                return Err(Error::Publish("chat not found".to_string()));
            }
            self.sent.lock().unwrap().push((channel_id, text.to_string()));
            Ok(())
        }
    }

    fn config() -> AppConfig {
        let mut config = AppConfig::default();
        config.telegram.channel_id = Some(-10042);
        config.delivery.lookback_secs = Some(3600);
        config
    }

    fn pipeline(db: &Database, reply: Reply, publisher: Arc<MockPublisher>) -> DeliveryPipeline {
        pipeline_with_store(Arc::new(db.clone()), reply, publisher)
    }

    fn pipeline_with_store(
        articles: Arc<dyn ArticleStore>,
        reply: Reply,
        publisher: Arc<MockPublisher>,
    ) -> DeliveryPipeline {
        let config = config();
        DeliveryPipeline::new(
            &config,
            articles,
            ContentExtractor::new(&config).unwrap(),
            Summarizer::with_provider(Arc::new(MockProvider(reply))),
            publisher,
        )
        .unwrap()
    }

    async fn insert(db: &Database, link: &str, published_at: DateTime<Utc>) -> i64 {
        let repo = ArticleRepository::new(db);
        repo.create(&NewArticle {
            source_id: 1,
            title: format!("Story {}", link),
            link: link.to_string(),
            summary: Some("Inline feed summary".to_string()),
            published_at,
        })
        .await
        .unwrap();
        repo.list_undelivered(published_at, 100)
            .await
            .unwrap()
            .into_iter()
            .find(|a| a.link == link)
            .unwrap()
            .id
    }

    async fn is_delivered(db: &Database, id: i64) -> bool {
        ArticleRepository::new(db)
            .find_by_id(id)
            .await
            .unwrap()
            .unwrap()
            .is_delivered()
    }

    #[tokio::test]
    async fn test_delivers_newest_article_once() {
        let db = Database::new_in_memory().await.unwrap();
        let now = Utc::now();
        let older = insert(&db, "https://a.example/older", now - ChronoDuration::minutes(30)).await;
        let newer = insert(&db, "https://a.example/newer", now - ChronoDuration::minutes(5)).await;

        let publisher = Arc::new(MockPublisher::default());
        let pipeline = pipeline(&db, Reply::Text("A short summary."), publisher.clone());
        let (_tx, rx) = watch::channel(false);

        let outcome = pipeline.run_once(rx.clone()).await.unwrap();
        assert_eq!(outcome, DeliveryOutcome::Delivered(newer));
        assert!(is_delivered(&db, newer).await);
        assert!(!is_delivered(&db, older).await);

        let outcome = pipeline.run_once(rx.clone()).await.unwrap();
        assert_eq!(outcome, DeliveryOutcome::Delivered(older));
        assert_eq!(pipeline.run_once(rx).await.unwrap(), DeliveryOutcome::Idle);

        let sent = publisher.sent();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0].0, -10042);
        assert_eq!(
            sent[0].1,
            format_message(
                "Story https://a.example/newer",
                "A short summary.",
                "https://a.example/newer"
            )
        );
    }

    #[tokio::test]
    async fn test_summarizer_failure_defers_article() {
        let db = Database::new_in_memory().await.unwrap();
        let id = insert(&db, "https://a.example/x", Utc::now()).await;

        let publisher = Arc::new(MockPublisher::default());
        let pipeline = pipeline(&db, Reply::Fail, publisher.clone());
        let (_tx, rx) = watch::channel(false);

        assert_eq!(pipeline.run_once(rx).await.unwrap(), DeliveryOutcome::Deferred(id));
        assert!(!is_delivered(&db, id).await);
        assert!(publisher.sent().is_empty());
    }

    #[tokio::test]
    async fn test_publish_failure_defers_article() {
        let db = Database::new_in_memory().await.unwrap();
        let id = insert(&db, "https://a.example/x", Utc::now()).await;

        let publisher = Arc::new(MockPublisher {
            fail: true,
            ..Default::default()
        });
        let pipeline = pipeline(&db, Reply::Text("Summary."), publisher);
        let (_tx, rx) = watch::channel(false);

        assert_eq!(pipeline.run_once(rx).await.unwrap(), DeliveryOutcome::Deferred(id));
        assert!(!is_delivered(&db, id).await);
    }

    #[tokio::test]
    async fn test_articles_outside_lookback_are_ignored() {
        let db = Database::new_in_memory().await.unwrap();
        insert(&db, "https://a.example/stale", Utc::now() - ChronoDuration::hours(3)).await;

        let publisher = Arc::new(MockPublisher::default());
        let pipeline = pipeline(&db, Reply::Text("Summary."), publisher.clone());
        let (_tx, rx) = watch::channel(false);

        assert_eq!(pipeline.run_once(rx).await.unwrap(), DeliveryOutcome::Idle);
        assert!(publisher.sent().is_empty());
    }

    #[tokio::test]
    async fn test_shutdown_interrupts_summarization() {
        let db = Database::new_in_memory().await.unwrap();
        let id = insert(&db, "https://a.example/x", Utc::now()).await;

        let pipeline = Arc::new(pipeline(&db, Reply::Hang, Arc::new(MockPublisher::default())));
        let (tx, rx) = watch::channel(false);

        let handle = {
            let pipeline = Arc::clone(&pipeline);
            tokio::spawn(async move { pipeline.run_once(rx).await })
        };
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        tx.send(true).unwrap();

        let result = tokio::time::timeout(std::time::Duration::from_secs(5), handle)
            .await
            .unwrap()
            .unwrap();
        assert!(matches!(result, Err(Error::Cancelled)));
        assert!(!is_delivered(&db, id).await);
    }

    #[test]
    fn test_requires_channel_id() {
        let config = AppConfig::default();
        let result = DeliveryPipeline::new(
            &config,
            Arc::new(NoStore),
            ContentExtractor::new(&config).unwrap(),
            Summarizer::with_provider(Arc::new(MockProvider(Reply::Fail))),
            Arc::new(MockPublisher::default()),
        );
        assert!(matches!(result, Err(Error::Config(_))));
    }

    struct NoStore;

    #[async_trait::async_trait]
    impl ArticleStore for NoStore {
        async fn store(&self, _article: &NewArticle) -> Result<bool> {
            Ok(false)
        }

        async fn list_undelivered(
            &self,
            _since: DateTime<Utc>,
            _limit: u32,
        ) -> Result<Vec<Article>> {
            Ok(Vec::new())
        }

        async fn mark_delivered(&self, _id: i64) -> Result<()> {
            Ok(())
        }
    }

    /// Delegates to the database, failing the selected operations
    struct FlakyStore {
        db: Database,
        fail_select: bool,
        fail_mark: bool,
    }

    #[async_trait::async_trait]
    impl ArticleStore for FlakyStore {
        async fn store(&self, article: &NewArticle) -> Result<bool> {
            self.db.store(article).await
        }

        async fn list_undelivered(
            &self,
            since: DateTime<Utc>,
            limit: u32,
        ) -> Result<Vec<Article>> {
            if self.fail_select {
                return Err(Error::Config("database unavailable".to_string()));
            }
            self.db.list_undelivered(since, limit).await
        }

        async fn mark_delivered(&self, id: i64) -> Result<()> {
            if self.fail_mark {
                return Err(Error::Config("database is locked".to_string()));
            }
            self.db.mark_delivered(id).await
        }
    }

    #[tokio::test]
    async fn test_selection_failure_stops_delivery_loop() {
        let db = Database::new_in_memory().await.unwrap();
        insert(&db, "https://a.example/x", Utc::now()).await;

        let store = Arc::new(FlakyStore {
            db,
            fail_select: true,
            fail_mark: false,
        });
        let publisher = Arc::new(MockPublisher::default());
        let pipeline = pipeline_with_store(store, Reply::Text("Summary."), publisher.clone());
        let (_tx, rx) = watch::channel(false);

        assert!(matches!(pipeline.run_once(rx.clone()).await, Err(Error::Config(_))));

        // the first tick is immediate, so the loop ends without waiting a period
        let result = tokio::time::timeout(
            std::time::Duration::from_secs(5),
            run_periodic(&pipeline, std::time::Duration::from_secs(600), rx),
        )
        .await
        .unwrap();
        assert!(matches!(result, Err(Error::Config(_))));
        assert!(publisher.sent().is_empty());
    }

    #[tokio::test]
    async fn test_mark_failure_defers_and_repeats_post() {
        let db = Database::new_in_memory().await.unwrap();
        let id = insert(&db, "https://a.example/x", Utc::now()).await;

        let store = Arc::new(FlakyStore {
            db: db.clone(),
            fail_select: false,
            fail_mark: true,
        });
        let publisher = Arc::new(MockPublisher::default());
        let pipeline = pipeline_with_store(store, Reply::Text("Summary."), publisher.clone());
        let (_tx, rx) = watch::channel(false);

        assert_eq!(pipeline.run_once(rx.clone()).await.unwrap(), DeliveryOutcome::Deferred(id));
        assert_eq!(pipeline.run_once(rx).await.unwrap(), DeliveryOutcome::Deferred(id));

        assert!(!is_delivered(&db, id).await);
        let sent = publisher.sent();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0], sent[1]);
    }
}
