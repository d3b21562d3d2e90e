// Work Item Port
// A unit of deferred, fire-and-forget work executed by the processor

use crate::domain::ShutdownToken;
use async_trait::async_trait;
use std::future::Future;
use thiserror::Error;

/// Item-level failures
///
/// These are logged and counted by the processor, never retried or
/// escalated. An item that wants retries must arrange them itself.
#[derive(Error, Debug)]
pub enum WorkItemError {
    #[error("Work item failed: {0}")]
    Failed(String),

    #[error("Work item cancelled by shutdown")]
    Cancelled,

    #[error(transparent)]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}

pub type WorkResult = std::result::Result<(), WorkItemError>;

/// Work Item trait
///
/// The item is consumed by `run`. The shutdown token is the processor's
/// stop signal; long-running items should watch it and return early.
///
/// Implementations:
/// - FnWorkItem: wraps an async closure
/// - mocks::*: recording/failing/panicking items for tests
#[async_trait]
pub trait WorkItem: Send + 'static {
    /// Execute the work
    ///
    /// # Errors
    /// Any error is reported to the processor's log and otherwise dropped.
    async fn run(self: Box<Self>, shutdown: ShutdownToken) -> WorkResult;

    /// Human-readable label used in logs and `try_peek`
    fn label(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

/// Adapter turning an async closure into a work item
pub struct FnWorkItem<F> {
    label: String,
    func: F,
}

impl<F, Fut> FnWorkItem<F>
where
    F: FnOnce(ShutdownToken) -> Fut + Send + 'static,
    Fut: Future<Output = WorkResult> + Send + 'static,
{
    pub fn new(label: impl Into<String>, func: F) -> Self {
        Self {
            label: label.into(),
            func,
        }
    }
}

#[async_trait]
impl<F, Fut> WorkItem for FnWorkItem<F>
where
    F: FnOnce(ShutdownToken) -> Fut + Send + 'static,
    Fut: Future<Output = WorkResult> + Send + 'static,
{
    async fn run(self: Box<Self>, shutdown: ShutdownToken) -> WorkResult {
        let FnWorkItem { func, .. } = *self;
        func(shutdown).await
    }

    fn label(&self) -> &str {
        &self.label
    }
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    /// Shared log of executed item labels, in completion order
    #[derive(Clone, Default)]
    pub struct ExecutionLog {
        entries: Arc<Mutex<Vec<String>>>,
    }

    impl ExecutionLog {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn record(&self, label: impl Into<String>) {
            self.entries.lock().push(label.into());
        }

        pub fn entries(&self) -> Vec<String> {
            self.entries.lock().clone()
        }

        pub fn len(&self) -> usize {
            self.entries.lock().len()
        }

        pub fn is_empty(&self) -> bool {
            self.entries.lock().is_empty()
        }
    }

    /// Mock item behavior
    #[derive(Debug, Clone)]
    pub enum MockBehavior {
        /// Record and succeed
        Success,
        /// Sleep for the duration (ignoring shutdown), then record
        Sleep(Duration),
        /// Sleep unless shutdown fires first; records either way
        CooperativeSleep(Duration),
        /// Record and fail with message
        Fail(String),
        /// Panic with message (for panic isolation testing)
        Panic(String),
    }

    /// Mock work item for testing
    pub struct MockWorkItem {
        label: String,
        behavior: MockBehavior,
        log: ExecutionLog,
        in_flight: Option<Arc<AtomicUsize>>,
        peak: Option<Arc<AtomicUsize>>,
    }

    impl MockWorkItem {
        pub fn new(label: impl Into<String>, behavior: MockBehavior, log: ExecutionLog) -> Self {
            Self {
                label: label.into(),
                behavior,
                log,
                in_flight: None,
                peak: None,
            }
        }

        pub fn new_success(label: impl Into<String>, log: ExecutionLog) -> Self {
            Self::new(label, MockBehavior::Success, log)
        }

        pub fn new_sleep(label: impl Into<String>, duration: Duration, log: ExecutionLog) -> Self {
            Self::new(label, MockBehavior::Sleep(duration), log)
        }

        pub fn new_fail(
            label: impl Into<String>,
            message: impl Into<String>,
            log: ExecutionLog,
        ) -> Self {
            Self::new(label, MockBehavior::Fail(message.into()), log)
        }

        pub fn new_panic_inducing(
            label: impl Into<String>,
            message: impl Into<String>,
            log: ExecutionLog,
        ) -> Self {
            Self::new(label, MockBehavior::Panic(message.into()), log)
        }

        /// Track how many items run at once (current, peak)
        pub fn with_concurrency_probe(
            mut self,
            in_flight: Arc<AtomicUsize>,
            peak: Arc<AtomicUsize>,
        ) -> Self {
            self.in_flight = Some(in_flight);
            self.peak = Some(peak);
            self
        }
    }

    #[async_trait]
    impl WorkItem for MockWorkItem {
        async fn run(self: Box<Self>, mut shutdown: ShutdownToken) -> WorkResult {
            if let (Some(in_flight), Some(peak)) = (&self.in_flight, &self.peak) {
                let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
            }

            let result = match &self.behavior {
                MockBehavior::Success => Ok(()),
                MockBehavior::Sleep(duration) => {
                    tokio::time::sleep(*duration).await;
                    Ok(())
                }
                MockBehavior::CooperativeSleep(duration) => {
                    tokio::select! {
                        _ = tokio::time::sleep(*duration) => Ok(()),
                        _ = shutdown.wait() => Err(WorkItemError::Cancelled),
                    }
                }
                MockBehavior::Fail(msg) => Err(WorkItemError::Failed(msg.clone())),
                MockBehavior::Panic(msg) => {
                    panic!("{}", msg); // Actually panic for panic isolation testing
                }
            };

            if let Some(in_flight) = &self.in_flight {
                in_flight.fetch_sub(1, Ordering::SeqCst);
            }
            self.log.record(self.label.clone());
            result
        }

        fn label(&self) -> &str {
            &self.label
        }
    }
}
