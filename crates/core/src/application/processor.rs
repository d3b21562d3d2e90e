// Queue Processor - supervises the worker pool draining a WorkQueue

use crate::application::queue::WorkQueue;
use crate::application::stats::{ProcessorStats, StatsSnapshot};
use crate::application::worker::{Worker, WorkerExit};
use crate::domain::{
    shutdown_channel, DomainError, ProcessorConfig, ProcessorState, ShutdownSender,
};
use crate::error::{AppError, Result};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

/// Long-running supervisor of `worker_count` concurrent workers
///
/// Workers are independent tokio tasks coordinated only through the queue.
/// Stopping is cooperative: blocked dequeues return, running items finish.
pub struct QueueProcessor {
    queue: Arc<WorkQueue>,
    config: ProcessorConfig,
    stats: Arc<ProcessorStats>,
    state: Mutex<ProcessorState>,
    shutdown: ShutdownSender,
    workers: Mutex<Vec<JoinHandle<WorkerExit>>>,
    // Serializes concurrent `stop` calls so only the last joiner marks Stopped
    stopping: tokio::sync::Mutex<()>,
}

impl std::fmt::Debug for QueueProcessor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueueProcessor")
            .field("config", &self.config)
            .field("state", &*self.state.lock())
            .finish()
    }
}

impl QueueProcessor {
    /// Attach a processor to an existing queue
    ///
    /// # Errors
    /// - DomainError::InvalidConfig if the queue was not built with
    ///   `config.queue_capacity()`
    pub fn new(queue: Arc<WorkQueue>, config: ProcessorConfig) -> Result<Self> {
        if queue.capacity() != config.queue_capacity() {
            return Err(DomainError::InvalidConfig(format!(
                "queue capacity {} does not match queue_capacity {}",
                queue.capacity(),
                config.queue_capacity()
            ))
            .into());
        }
        Ok(Self::assemble(queue, config))
    }

    /// Build a queue sized from `config` together with its processor
    pub fn with_new_queue(config: ProcessorConfig) -> Self {
        Self::assemble(Arc::new(WorkQueue::from_config(&config)), config)
    }

    fn assemble(queue: Arc<WorkQueue>, config: ProcessorConfig) -> Self {
        let (shutdown, _token) = shutdown_channel();
        Self {
            queue,
            config,
            stats: Arc::new(ProcessorStats::new()),
            state: Mutex::new(ProcessorState::Starting),
            shutdown,
            workers: Mutex::new(Vec::new()),
            stopping: tokio::sync::Mutex::new(()),
        }
    }

    pub fn queue(&self) -> &Arc<WorkQueue> {
        &self.queue
    }

    pub fn config(&self) -> &ProcessorConfig {
        &self.config
    }

    pub fn state(&self) -> ProcessorState {
        *self.state.lock()
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    /// Number of worker tasks not yet joined by `stop`
    pub fn active_workers(&self) -> usize {
        self.workers
            .lock()
            .iter()
            .filter(|handle| !handle.is_finished())
            .count()
    }

    /// Spawn the worker pool (`Starting -> Running`)
    ///
    /// # Errors
    /// - DomainError::InvalidStateTransition unless the processor is `Starting`
    /// - AppError::InvalidState when called outside a tokio runtime
    pub fn start(&self) -> Result<()> {
        let mut state = self.state.lock();
        if !state.can_transition_to(ProcessorState::Running) {
            return Err(AppError::transition(*state, ProcessorState::Running));
        }
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| AppError::InvalidState(format!("no tokio runtime: {}", e)))?;

        info!(
            workers = self.config.worker_count(),
            capacity = self.queue.capacity(),
            "Queue processor is running"
        );

        let mut workers = self.workers.lock();
        for id in 0..self.config.worker_count() {
            let worker = Worker::new(id, Arc::clone(&self.queue), Arc::clone(&self.stats));
            let token = self.shutdown.token();
            workers.push(runtime.spawn(async move { worker.run(token).await }));
        }
        *state = ProcessorState::Running;
        Ok(())
    }

    /// Signal shutdown and wait for every worker (`-> Stopping -> Stopped`)
    ///
    /// The queue is closed as soon as shutdown is signalled: later and
    /// waiting producers get `QueueError::Closed`, buffered items stay put.
    /// Returns once all workers have exited, or with `StopTimeout` when
    /// `timeout` elapses first. In-flight items are never aborted: after a
    /// timeout the processor stays `Stopping` and a later call resumes the wait.
    pub async fn stop(&self, timeout: Option<Duration>) -> Result<()> {
        let _stopping = self.stopping.lock().await;
        {
            let mut state = self.state.lock();
            match *state {
                ProcessorState::Stopped => return Ok(()),
                ProcessorState::Stopping => {}
                current => {
                    if !current.can_transition_to(ProcessorState::Stopping) {
                        return Err(AppError::transition(current, ProcessorState::Stopping));
                    }
                    info!(queued = self.queue.len(), "Queue processor is stopping");
                    *state = ProcessorState::Stopping;
                }
            }
        }
        self.shutdown.shutdown();
        self.queue.close();

        let deadline = timeout.map(|t| tokio::time::Instant::now() + t);
        let mut pending = std::mem::take(&mut *self.workers.lock());

        while let Some(mut handle) = pending.pop() {
            let joined = match deadline {
                Some(deadline) => match tokio::time::timeout_at(deadline, &mut handle).await {
                    Ok(joined) => joined,
                    Err(_) => {
                        pending.push(handle);
                        let still_running = pending.len();
                        self.workers.lock().extend(pending);
                        warn!(pending = still_running, "Queue processor stop timed out");
                        return Err(AppError::StopTimeout {
                            timeout_ms: timeout.unwrap_or_default().as_millis(),
                            pending: still_running,
                        });
                    }
                },
                None => (&mut handle).await,
            };
            if let Err(e) = joined {
                error!(error = %e, "Worker task ended abnormally");
            }
        }

        self.transition_stopped()
    }

    fn transition_stopped(&self) -> Result<()> {
        let mut state = self.state.lock();
        if !state.can_transition_to(ProcessorState::Stopped) {
            return Err(AppError::transition(*state, ProcessorState::Stopped));
        }
        *state = ProcessorState::Stopped;
        let stats = self.stats.snapshot();
        info!(
            succeeded = stats.succeeded,
            failed = stats.failed,
            panicked = stats.panicked,
            left_in_queue = self.queue.len(),
            "Queue processor stopped"
        );
        Ok(())
    }
}

impl Drop for QueueProcessor {
    fn drop(&mut self) {
        // Detached workers still get to finish their current item
        self.shutdown.shutdown();
        self.queue.close();
    }
}
