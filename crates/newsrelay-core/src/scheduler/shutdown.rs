use tokio::sync::watch;

/// Resolve once the shutdown flag is set.
///
/// A dropped sender never signals shutdown, so the future stays pending.
pub async fn wait_for_shutdown(shutdown: &mut watch::Receiver<bool>) {
    loop {
        if *shutdown.borrow_and_update() {
            return;
        }
        if shutdown.changed().await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::time::timeout;

    #[tokio::test]
    async fn test_returns_when_already_set() {
        let (_tx, mut rx) = watch::channel(true);
        timeout(Duration::from_secs(1), wait_for_shutdown(&mut rx))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_returns_on_signal() {
        let (tx, mut rx) = watch::channel(false);
        let waiter = tokio::spawn(async move { wait_for_shutdown(&mut rx).await });

        tx.send(true).unwrap();
        timeout(Duration::from_secs(1), waiter).await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_dropped_sender_does_not_signal() {
        let (tx, mut rx) = watch::channel(false);
        drop(tx);

        let result = timeout(Duration::from_millis(50), wait_for_shutdown(&mut rx)).await;
        assert!(result.is_err());
    }
}
