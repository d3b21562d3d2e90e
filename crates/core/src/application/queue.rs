// Work Queue - bounded FIFO with backpressure
//
// One mutex guards the buffer and the closed flag. Two `Notify`s wake the
// complementary side: a dequeue wakes one waiting producer, an enqueue wakes
// one waiting consumer. Every waiter enables its `Notified` before checking
// state, so a wake-up between the check and the await is not lost.

use crate::domain::{DomainError, ItemId, ItemInfo, ProcessorConfig, QueueError, ShutdownToken};
use crate::port::{FnWorkItem, WorkItem, WorkResult};
use chrono::Utc;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::fmt;
use std::future::Future;
use tokio::sync::Notify;
use tracing::{debug, info};

/// An item accepted by the queue, together with its descriptor
pub struct QueuedItem {
    info: ItemInfo,
    item: Box<dyn WorkItem>,
}

impl QueuedItem {
    fn new(item: Box<dyn WorkItem>) -> Self {
        Self {
            info: ItemInfo::new(item.label()),
            item,
        }
    }

    pub fn id(&self) -> ItemId {
        self.info.id
    }

    pub fn info(&self) -> &ItemInfo {
        &self.info
    }

    /// Split into descriptor and the executable item
    pub fn into_parts(self) -> (ItemInfo, Box<dyn WorkItem>) {
        (self.info, self.item)
    }
}

impl fmt::Debug for QueuedItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueuedItem").field("info", &self.info).finish()
    }
}

struct QueueState {
    items: VecDeque<QueuedItem>,
    closed: bool,
}

/// Bounded, multi-producer multi-consumer work queue
pub struct WorkQueue {
    capacity: usize,
    state: Mutex<QueueState>,
    not_full: Notify,
    not_empty: Notify,
}

impl WorkQueue {
    /// Create a queue holding at most `capacity` items
    pub fn new(capacity: usize) -> Result<Self, DomainError> {
        if capacity == 0 {
            return Err(DomainError::InvalidConfig(
                "queue capacity must be positive".to_string(),
            ));
        }
        Ok(Self::with_valid_capacity(capacity))
    }

    pub fn from_config(config: &ProcessorConfig) -> Self {
        Self::with_valid_capacity(config.queue_capacity())
    }

    fn with_valid_capacity(capacity: usize) -> Self {
        Self {
            capacity,
            state: Mutex::new(QueueState {
                items: VecDeque::with_capacity(capacity),
                closed: false,
            }),
            not_full: Notify::new(),
            not_empty: Notify::new(),
        }
    }

    /// Append a work item, waiting for a free slot if the queue is full
    ///
    /// # Errors
    /// - QueueError::Closed if the queue is closed before the item is accepted
    pub async fn enqueue<W: WorkItem>(&self, item: W) -> Result<ItemId, QueueError> {
        self.enqueue_boxed(Box::new(item)).await
    }

    /// Append an async closure as a work item
    pub async fn enqueue_fn<F, Fut>(
        &self,
        label: impl Into<String>,
        func: F,
    ) -> Result<ItemId, QueueError>
    where
        F: FnOnce(ShutdownToken) -> Fut + Send + 'static,
        Fut: Future<Output = WorkResult> + Send + 'static,
    {
        self.enqueue(FnWorkItem::new(label, func)).await
    }

    /// Append an already boxed work item
    pub async fn enqueue_boxed(&self, item: Box<dyn WorkItem>) -> Result<ItemId, QueueError> {
        let mut entry = QueuedItem::new(item);
        let mut announced_wait = false;

        loop {
            let notified = self.not_full.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            {
                let mut state = self.state.lock();
                if state.closed {
                    return Err(QueueError::Closed);
                }
                if state.items.len() < self.capacity {
                    // Stamped on acceptance, not when the producer started waiting
                    entry.info.enqueued_at = Utc::now();
                    let id = entry.id();
                    debug!(item_id = %id, label = %entry.info.label, "Work item enqueued");
                    state.items.push_back(entry);
                    drop(state);
                    self.not_empty.notify_one();
                    return Ok(id);
                }
            }

            if !announced_wait {
                debug!(capacity = self.capacity, "Work queue full, producer waiting");
                announced_wait = true;
            }
            notified.await;
        }
    }

    /// Remove and return the head item, waiting while the queue is empty
    ///
    /// A closed queue still hands out what it buffered.
    ///
    /// # Errors
    /// - QueueError::Cancelled if `shutdown` fires first (queue untouched)
    /// - QueueError::Closed once the queue is closed and empty
    pub async fn dequeue(&self, shutdown: &mut ShutdownToken) -> Result<QueuedItem, QueueError> {
        loop {
            if shutdown.is_shutdown() {
                return Err(QueueError::Cancelled);
            }

            let notified = self.not_empty.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            {
                let mut state = self.state.lock();
                if let Some(entry) = state.items.pop_front() {
                    let more = !state.items.is_empty();
                    drop(state);
                    self.not_full.notify_one();
                    if more {
                        // Pass the baton in case our own wake-up consumed a permit meant for a peer
                        self.not_empty.notify_one();
                    }
                    debug!(item_id = %entry.id(), "Work item dequeued");
                    return Ok(entry);
                }
                if state.closed {
                    return Err(QueueError::Closed);
                }
            }

            tokio::select! {
                biased;
                _ = shutdown.wait() => return Err(QueueError::Cancelled),
                _ = &mut notified => {}
            }
        }
    }

    /// Descriptor of the head item, without removing it; never waits
    pub fn try_peek(&self) -> Option<ItemInfo> {
        self.state.lock().items.front().map(|entry| entry.info.clone())
    }

    /// Current number of buffered items (may be stale once returned)
    pub fn len(&self) -> usize {
        self.state.lock().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.lock().items.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Permanently close the queue
    ///
    /// Waiting and future producers fail with `Closed`. Consumers drain the
    /// remaining items, then get `Closed`.
    pub fn close(&self) {
        let remaining = {
            let mut state = self.state.lock();
            if state.closed {
                return;
            }
            state.closed = true;
            state.items.len()
        };
        info!(remaining, "Work queue closed");
        self.not_full.notify_waiters();
        self.not_empty.notify_waiters();
    }

    pub fn is_closed(&self) -> bool {
        self.state.lock().closed
    }
}

impl fmt::Debug for WorkQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock();
        f.debug_struct("WorkQueue")
            .field("capacity", &self.capacity)
            .field("len", &state.items.len())
            .field("closed", &state.closed)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::shutdown_channel;
    use crate::port::work_item::mocks::{ExecutionLog, MockWorkItem};
    use std::sync::Arc;
    use std::time::Duration;
    use tokio_test::{assert_pending, assert_ready, assert_ready_eq, task};

    fn item(label: &str, log: &ExecutionLog) -> MockWorkItem {
        MockWorkItem::new_success(label, log.clone())
    }

    #[test]
    fn test_zero_capacity_rejected() {
        assert!(WorkQueue::new(0).is_err());
        assert_eq!(WorkQueue::new(3).unwrap().capacity(), 3);
    }

    #[tokio::test]
    async fn test_fifo_order() {
        let queue = WorkQueue::new(10).unwrap();
        let log = ExecutionLog::new();
        let mut token = ShutdownToken::never();

        for label in ["a", "b", "c"] {
            queue.enqueue(item(label, &log)).await.unwrap();
        }
        assert_eq!(queue.len(), 3);

        let mut labels = Vec::new();
        for _ in 0..3 {
            labels.push(queue.dequeue(&mut token).await.unwrap().info().label.clone());
        }
        assert_eq!(labels, vec!["a", "b", "c"]);
        assert!(queue.is_empty());
    }

    #[tokio::test]
    async fn test_enqueue_returns_assigned_id() {
        let queue = WorkQueue::new(2).unwrap();
        let log = ExecutionLog::new();
        let id = queue.enqueue(item("a", &log)).await.unwrap();

        assert_eq!(queue.try_peek().unwrap().id, id);
        let entry = queue.dequeue(&mut ShutdownToken::never()).await.unwrap();
        assert_eq!(entry.id(), id);
    }

    #[test]
    fn test_enqueue_blocks_when_full() {
        let queue = WorkQueue::new(1).unwrap();
        let log = ExecutionLog::new();
        let mut token = ShutdownToken::never();

        let mut first = task::spawn(queue.enqueue(item("a", &log)));
        assert!(assert_ready!(first.poll()).is_ok());
        drop(first);

        let mut second = task::spawn(queue.enqueue(item("b", &log)));
        assert_pending!(second.poll());
        assert_eq!(queue.len(), 1, "capacity must never be exceeded");

        let mut take = task::spawn(queue.dequeue(&mut token));
        let head = assert_ready!(take.poll()).unwrap();
        assert_eq!(head.info().label, "a");
        drop(take);

        assert!(second.is_woken(), "freeing a slot must wake the producer");
        assert!(assert_ready!(second.poll()).is_ok());
        assert_eq!(queue.len(), 1);
        assert_eq!(queue.try_peek().unwrap().label, "b");
    }

    #[test]
    fn test_enqueued_at_marks_acceptance_after_wait() {
        let queue = WorkQueue::new(1).unwrap();
        let log = ExecutionLog::new();
        let mut token = ShutdownToken::never();

        let mut first = task::spawn(queue.enqueue(item("a", &log)));
        assert!(assert_ready!(first.poll()).is_ok());
        drop(first);

        let mut second = task::spawn(queue.enqueue(item("b", &log)));
        assert_pending!(second.poll());
        std::thread::sleep(Duration::from_millis(20));
        let slot_freed_at = Utc::now();

        let mut take = task::spawn(queue.dequeue(&mut token));
        assert!(assert_ready!(take.poll()).is_ok());
        drop(take);

        assert!(assert_ready!(second.poll()).is_ok());
        let accepted = queue.try_peek().unwrap();
        assert_eq!(accepted.label, "b");
        assert!(
            accepted.enqueued_at >= slot_freed_at,
            "timestamp must reflect acceptance, not the start of the wait"
        );
    }

    #[test]
    fn test_dequeue_blocks_when_empty() {
        let queue = WorkQueue::new(4).unwrap();
        let log = ExecutionLog::new();
        let mut token = ShutdownToken::never();

        let mut take = task::spawn(queue.dequeue(&mut token));
        assert_pending!(take.poll());

        let mut put = task::spawn(queue.enqueue(item("late", &log)));
        assert!(assert_ready!(put.poll()).is_ok());

        assert!(take.is_woken(), "enqueue must wake the waiting consumer");
        let entry = assert_ready!(take.poll()).unwrap();
        assert_eq!(entry.info().label, "late");
    }

    #[test]
    fn test_dequeue_cancelled_leaves_queue_untouched() {
        let queue = WorkQueue::new(4).unwrap();
        let (tx, mut token) = shutdown_channel();

        let mut take = task::spawn(queue.dequeue(&mut token));
        assert_pending!(take.poll());

        tx.shutdown();
        assert!(take.is_woken());
        assert_ready_eq!(take.poll().map(|r| r.map(|e| e.id())), Err(QueueError::Cancelled));
        drop(take);

        assert!(queue.is_empty());
        assert!(!queue.is_closed());
    }

    #[tokio::test]
    async fn test_dequeue_with_fired_token_does_not_consume() {
        let queue = WorkQueue::new(4).unwrap();
        let log = ExecutionLog::new();
        queue.enqueue(item("kept", &log)).await.unwrap();

        let (tx, mut token) = shutdown_channel();
        tx.shutdown();

        let result = queue.dequeue(&mut token).await;
        assert_eq!(result.unwrap_err(), QueueError::Cancelled);
        assert_eq!(queue.len(), 1);
    }

    #[tokio::test]
    async fn test_try_peek_empty_and_non_destructive() {
        let queue = WorkQueue::new(4).unwrap();
        let log = ExecutionLog::new();
        assert!(queue.try_peek().is_none());
        assert_eq!(queue.len(), 0);

        queue.enqueue(item("head", &log)).await.unwrap();
        queue.enqueue(item("tail", &log)).await.unwrap();

        let first = queue.try_peek().unwrap();
        let again = queue.try_peek().unwrap();
        assert_eq!(first, again);
        assert_eq!(first.label, "head");
        assert_eq!(queue.len(), 2);
    }

    #[tokio::test]
    async fn test_close_rejects_enqueue_and_drains() {
        let queue = WorkQueue::new(4).unwrap();
        let log = ExecutionLog::new();
        let mut token = ShutdownToken::never();

        queue.enqueue(item("buffered", &log)).await.unwrap();
        queue.close();
        queue.close();
        assert!(queue.is_closed());

        let rejected = queue.enqueue(item("late", &log)).await;
        assert_eq!(rejected.unwrap_err(), QueueError::Closed);

        let entry = queue.dequeue(&mut token).await.unwrap();
        assert_eq!(entry.info().label, "buffered");
        assert_eq!(queue.dequeue(&mut token).await.unwrap_err(), QueueError::Closed);
    }

    #[test]
    fn test_close_wakes_blocked_producer_and_consumer() {
        let full = WorkQueue::new(1).unwrap();
        let empty = WorkQueue::new(1).unwrap();
        let log = ExecutionLog::new();
        let mut token = ShutdownToken::never();

        let mut fill = task::spawn(full.enqueue(item("a", &log)));
        assert!(assert_ready!(fill.poll()).is_ok());
        drop(fill);

        let mut producer = task::spawn(full.enqueue(item("b", &log)));
        assert_pending!(producer.poll());
        let mut consumer = task::spawn(empty.dequeue(&mut token));
        assert_pending!(consumer.poll());

        full.close();
        empty.close();

        assert!(producer.is_woken());
        assert!(consumer.is_woken());
        assert_eq!(assert_ready!(producer.poll()).unwrap_err(), QueueError::Closed);
        assert_eq!(assert_ready!(consumer.poll()).unwrap_err(), QueueError::Closed);
        assert_eq!(full.len(), 1);
    }

    #[tokio::test]
    async fn test_enqueue_fn_runs_closure() {
        let queue = WorkQueue::new(2).unwrap();
        let log = ExecutionLog::new();
        let inner = log.clone();

        queue
            .enqueue_fn("closure", move |_shutdown| async move {
                inner.record("ran");
                Ok(())
            })
            .await
            .unwrap();

        assert_eq!(queue.try_peek().unwrap().label, "closure");
        let (_, work) = queue
            .dequeue(&mut ShutdownToken::never())
            .await
            .unwrap()
            .into_parts();
        work.run(ShutdownToken::never()).await.unwrap();
        assert_eq!(log.entries(), vec!["ran".to_string()]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_consumers_no_duplicates() {
        let queue = Arc::new(WorkQueue::new(8).unwrap());
        let (tx, token) = shutdown_channel();
        let log = ExecutionLog::new();

        let mut consumers = Vec::new();
        for _ in 0..4 {
            let queue = Arc::clone(&queue);
            let mut token = token.clone();
            consumers.push(tokio::spawn(async move {
                let mut seen = Vec::new();
                while let Ok(entry) = queue.dequeue(&mut token).await {
                    seen.push(entry.id());
                }
                seen
            }));
        }

        let mut sent = Vec::new();
        for i in 0..200 {
            sent.push(queue.enqueue(item(&format!("item-{}", i), &log)).await.unwrap());
        }

        while !queue.is_empty() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        tx.shutdown();

        let mut received = Vec::new();
        for consumer in consumers {
            received.extend(consumer.await.unwrap());
        }

        assert_eq!(received.len(), 200, "every item delivered exactly once");
        received.sort();
        received.dedup();
        assert_eq!(received.len(), 200, "no item delivered twice");
        sent.sort();
        assert_eq!(sent, received);
    }
}
