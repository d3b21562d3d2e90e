// Worker - dequeue/execute loop

pub mod constants;
mod panic_guard;

use constants::SLOW_ITEM_THRESHOLD;
pub use panic_guard::{execute_guarded, PanicGuardResult};

use crate::application::queue::{QueuedItem, WorkQueue};
use crate::application::stats::ProcessorStats;
use crate::domain::{QueueError, ShutdownToken};
use crate::port::WorkItemError;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// Why a worker loop returned
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerExit {
    /// Shutdown signal observed
    Shutdown,
    /// Queue closed and fully drained
    QueueClosed,
}

/// One of the processor's concurrent consumers
pub struct Worker {
    id: usize,
    queue: Arc<WorkQueue>,
    stats: Arc<ProcessorStats>,
}

impl Worker {
    pub fn new(id: usize, queue: Arc<WorkQueue>, stats: Arc<ProcessorStats>) -> Self {
        Self { id, queue, stats }
    }

    pub fn id(&self) -> usize {
        self.id
    }

    /// Run worker loop with graceful shutdown support
    ///
    /// The item currently executing is never interrupted; the shutdown signal
    /// is only observed by the next `dequeue`.
    pub async fn run(&self, mut shutdown: ShutdownToken) -> WorkerExit {
        debug!(worker_id = self.id, "Worker started");
        let exit = loop {
            let entry = match self.queue.dequeue(&mut shutdown).await {
                Ok(entry) => entry,
                Err(QueueError::Cancelled) => break WorkerExit::Shutdown,
                Err(QueueError::Closed) => break WorkerExit::QueueClosed,
            };
            self.stats.record_dequeued();
            self.execute(entry, shutdown.clone()).await;
        };
        debug!(worker_id = self.id, exit = ?exit, "Worker stopped");
        exit
    }

    /// Execute one item; failures and panics are recorded, never propagated
    async fn execute(&self, entry: QueuedItem, shutdown: ShutdownToken) {
        let (info, item) = entry.into_parts();
        debug!(worker_id = self.id, item_id = %info.id, label = %info.label, "Executing work item");

        let started = Instant::now();
        let outcome = execute_guarded(item.run(shutdown)).await;
        let elapsed_ms = started.elapsed().as_millis() as u64;

        match outcome {
            PanicGuardResult::Success(Ok(())) => {
                self.stats.record_succeeded();
                debug!(item_id = %info.id, elapsed_ms, "Work item completed");
            }
            PanicGuardResult::Success(Err(WorkItemError::Cancelled)) => {
                self.stats.record_failed();
                warn!(item_id = %info.id, label = %info.label, "Work item stopped on shutdown");
            }
            PanicGuardResult::Success(Err(e)) => {
                self.stats.record_failed();
                error!(
                    worker_id = self.id,
                    item_id = %info.id,
                    label = %info.label,
                    error = %e,
                    "Work item failed"
                );
            }
            PanicGuardResult::Panicked(msg) => {
                self.stats.record_panicked();
                error!(
                    worker_id = self.id,
                    item_id = %info.id,
                    label = %info.label,
                    panic_msg = %msg,
                    "Work item panicked; worker continues"
                );
            }
            PanicGuardResult::Cancelled => {
                self.stats.record_failed();
                warn!(item_id = %info.id, label = %info.label, "Work item task cancelled");
            }
        }

        if started.elapsed() > SLOW_ITEM_THRESHOLD {
            info!(item_id = %info.id, label = %info.label, elapsed_ms, "Slow work item");
        }
    }
}
