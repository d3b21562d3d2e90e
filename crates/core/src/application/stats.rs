// Processor statistics

use std::sync::atomic::{AtomicU64, Ordering};

/// Counters shared by every worker of a processor
#[derive(Debug, Default)]
pub struct ProcessorStats {
    dequeued: AtomicU64,
    succeeded: AtomicU64,
    failed: AtomicU64,
    panicked: AtomicU64,
}

/// Point-in-time copy of `ProcessorStats`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub dequeued: u64,
    pub succeeded: u64,
    pub failed: u64,
    pub panicked: u64,
}

impl StatsSnapshot {
    /// Items whose execution attempt has returned, whatever the outcome
    pub fn finished(&self) -> u64 {
        self.succeeded + self.failed + self.panicked
    }

    /// Items claimed by a worker but not yet finished
    pub fn in_flight(&self) -> u64 {
        self.dequeued.saturating_sub(self.finished())
    }
}

impl ProcessorStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record_dequeued(&self) {
        self.dequeued.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_succeeded(&self) {
        self.succeeded.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_failed(&self) {
        self.failed.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_panicked(&self) {
        self.panicked.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            dequeued: self.dequeued.load(Ordering::Relaxed),
            succeeded: self.succeeded.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            panicked: self.panicked.load(Ordering::Relaxed),
        }
    }
}
