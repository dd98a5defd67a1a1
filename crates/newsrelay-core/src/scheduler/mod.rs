mod delivery;
mod ingest;
mod service;
mod shutdown;

pub use delivery::{DeliveryOutcome, DeliveryPipeline};
pub use ingest::{IngestPipeline, IngestReport};
pub use service::{run_periodic, PeriodicTask, SchedulerService};
pub use shutdown::wait_for_shutdown;
