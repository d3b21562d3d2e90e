// Workpool Core - Bounded work queue, worker pool, and the work item port
// NO host dependencies: config loading and subscriber setup live in the daemon

pub mod application;
pub mod domain;
pub mod error;
pub mod port;

pub use application::{ProcessorStats, QueueProcessor, StatsSnapshot, WorkQueue};
pub use domain::{
    shutdown_channel, ItemId, ItemInfo, ProcessorConfig, ProcessorState, QueueError,
    ShutdownSender, ShutdownToken,
};
pub use error::{AppError, Result};
pub use port::{FnWorkItem, WorkItem, WorkItemError, WorkResult};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
