use std::sync::Arc;

use anyhow::Result;
use tokio::sync::watch;
use tracing::info;

use newsrelay_core::{scheduler::SchedulerService, storage::Database, AppConfig};

/// Run both loops until Ctrl+C or SIGTERM
pub async fn run(db: Database, config: Arc<AppConfig>) -> Result<()> {
    let ingest = super::ingest_pipeline(&db, &config)?;
    let delivery = super::delivery_pipeline(&db, &config)?;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    tokio::spawn(async move {
        shutdown_signal().await;
        info!("Received shutdown signal");
        let _ = shutdown_tx.send(true);
    });

    let scheduler = SchedulerService::new()
        .with_task(Arc::new(ingest))
        .with_task(Arc::new(delivery));

    println!("newsrelay started (PID: {}). Press Ctrl+C to stop.", std::process::id());
    println!("  Fetch interval: {} seconds", config.ingest.fetch_interval_secs);
    println!("  Send interval:  {} seconds", config.delivery.send_interval_secs);
    println!("  Lookback:       {} seconds", config.lookback().as_secs());

    scheduler.run(shutdown_rx).await;

    println!("newsrelay stopped.");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::warn!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
