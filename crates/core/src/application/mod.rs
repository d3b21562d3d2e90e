// Application Layer - Queue, worker loop and the processor supervising it

pub mod processor;
pub mod queue;
pub mod stats;
pub mod worker;

// Re-exports
pub use processor::QueueProcessor;
pub use queue::{QueuedItem, WorkQueue};
pub use stats::{ProcessorStats, StatsSnapshot};
pub use worker::{Worker, WorkerExit};
