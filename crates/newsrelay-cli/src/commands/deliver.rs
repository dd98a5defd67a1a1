use anyhow::Result;
use tokio::sync::watch;

use newsrelay_core::{scheduler::DeliveryOutcome, storage::Database, AppConfig};

pub async fn run(db: &Database, config: &AppConfig) -> Result<()> {
    let pipeline = super::delivery_pipeline(db, config)?;
    let (_shutdown_tx, shutdown_rx) = watch::channel(false);

    match pipeline.run_once(shutdown_rx).await? {
        DeliveryOutcome::Idle => println!("Nothing to deliver."),
        DeliveryOutcome::Delivered(id) => println!("Delivered article {}.", id),
        DeliveryOutcome::Deferred(id) => {
            println!("Article {} could not be delivered; it will be retried.", id);
            println!("See the log for details.");
        }
    }

    Ok(())
}
