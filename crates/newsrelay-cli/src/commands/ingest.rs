use anyhow::Result;
use tokio::sync::watch;

use newsrelay_core::{storage::Database, AppConfig};

pub async fn run(db: &Database, config: &AppConfig) -> Result<()> {
    println!("Fetching all sources...\n");

    let pipeline = super::ingest_pipeline(db, config)?;
    let (_shutdown_tx, shutdown_rx) = watch::channel(false);
    let report = pipeline.run_once(shutdown_rx).await?;

    println!(
        "Ingestion complete: {} sources ({} failed), {} items, {} filtered, {} new articles.",
        report.sources, report.failed_sources, report.items, report.skipped, report.stored
    );

    Ok(())
}
