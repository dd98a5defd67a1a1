use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinSet;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info};

use super::shutdown::wait_for_shutdown;
use crate::Result;

/// A unit of work repeated on a fixed interval
#[async_trait::async_trait]
pub trait PeriodicTask: Send + Sync {
    fn name(&self) -> &'static str;

    /// Interval between two ticks
    fn period(&self) -> Duration;

    async fn tick(&self, shutdown: watch::Receiver<bool>) -> Result<()>;
}

/// Run `task` immediately and then every `period` until shutdown.
///
/// Returns `Ok(())` on shutdown or when a tick reports cancellation. Any
/// other tick error ends the loop and is returned.
pub async fn run_periodic(
    task: &dyn PeriodicTask,
    period: Duration,
    mut shutdown: watch::Receiver<bool>,
) -> Result<()> {
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;

            _ = wait_for_shutdown(&mut shutdown) => {
                debug!("{} loop received shutdown signal", task.name());
                return Ok(());
            }

            _ = interval.tick() => {}
        }

        match task.tick(shutdown.clone()).await {
            Ok(()) => {}
            Err(e) if e.is_cancelled() => return Ok(()),
            Err(e) => return Err(e),
        }
    }
}

/// Background service driving independent periodic loops
pub struct SchedulerService {
    tasks: Vec<Arc<dyn PeriodicTask>>,
}

impl SchedulerService {
    /// Create a new scheduler service
    pub fn new() -> Self {
        Self { tasks: Vec::new() }
    }

    /// Add a loop to the service
    pub fn with_task(mut self, task: Arc<dyn PeriodicTask>) -> Self {
        self.tasks.push(task);
        self
    }

    /// Run every loop until shutdown. A loop that stops on error does not
    /// stop the others.
    pub async fn run(self, shutdown: watch::Receiver<bool>) {
        info!("Scheduler started with {} loops", self.tasks.len());

        let mut join_set = JoinSet::new();
        for task in self.tasks {
            let rx = shutdown.clone();
            join_set.spawn(async move {
                info!("{} loop started, every {:?}", task.name(), task.period());
                let result = run_periodic(task.as_ref(), task.period(), rx).await;
                (task.name(), result)
            });
        }

        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok((name, Ok(()))) => info!("{} loop stopped on shutdown", name),
                Ok((name, Err(e))) => error!("{} loop stopped: {}", name, e),
                Err(e) => error!("Scheduler loop panicked: {}", e),
            }
        }

        info!("Scheduler stopped");
    }
}

impl Default for SchedulerService {
    fn default() -> Self {
        Self::new()
    }
}
