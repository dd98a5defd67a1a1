pub mod add_source;
pub mod daemon;
pub mod delete_source;
pub mod deliver;
pub mod ingest;
pub mod init_config;
pub mod list_sources;
pub mod show_source;

use std::sync::Arc;

use anyhow::Result;

use newsrelay_core::{
    ai::Summarizer,
    content::ContentExtractor,
    feed::FeedFetcher,
    publish::TelegramPublisher,
    scheduler::{DeliveryPipeline, IngestPipeline},
    storage::Database,
    AppConfig,
};

/// Wire the ingestion pipeline to the database and the HTTP feed client
pub fn ingest_pipeline(db: &Database, config: &AppConfig) -> Result<IngestPipeline> {
    let fetcher = FeedFetcher::new(config)?;
    Ok(IngestPipeline::new(
        config,
        Arc::new(db.clone()),
        Arc::new(db.clone()),
        Arc::new(fetcher),
    ))
}

/// Wire the delivery pipeline; fails when Telegram or OpenAI settings are missing
pub fn delivery_pipeline(db: &Database, config: &AppConfig) -> Result<DeliveryPipeline> {
    config.validate_delivery()?;

    let pipeline = DeliveryPipeline::new(
        config,
        Arc::new(db.clone()),
        ContentExtractor::new(config)?,
        Summarizer::new(config)?,
        Arc::new(TelegramPublisher::new(config)?),
    )?;
    Ok(pipeline)
}
