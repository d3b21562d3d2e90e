//! Synthetic load for exercising a running processor

use crate::settings::DemoSettings;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;
use tracing::{debug, info};
use workpool_core::{QueueError, ShutdownToken, WorkItemError, WorkQueue};

/// Spawn `demo.producers` tasks that together enqueue `demo.items` items
///
/// Each item sleeps `item_duration_ms` unless shutdown fires first. A
/// producer stops early when the queue is closed. Each task yields the number
/// of items it got accepted.
pub fn spawn_load(queue: Arc<WorkQueue>, demo: &DemoSettings) -> JoinSet<usize> {
    let producers = demo.producers.max(1);
    let duration = Duration::from_millis(demo.item_duration_ms);
    let mut set = JoinSet::new();

    for producer in 0..producers {
        // Spread the remainder over the first producers
        let share = demo.items / producers + usize::from(producer < demo.items % producers);
        let queue = Arc::clone(&queue);

        set.spawn(async move {
            let mut accepted = 0;
            for seq in 0..share {
                let label = format!("demo-{}-{}", producer, seq);
                let result = queue
                    .enqueue_fn(label, move |mut shutdown: ShutdownToken| async move {
                        tokio::select! {
                            _ = tokio::time::sleep(duration) => Ok(()),
                            _ = shutdown.wait() => Err(WorkItemError::Cancelled),
                        }
                    })
                    .await;
                match result {
                    Ok(id) => {
                        debug!(producer, item_id = %id, "Demo item accepted");
                        accepted += 1;
                    }
                    Err(QueueError::Closed) | Err(QueueError::Cancelled) => {
                        info!(producer, accepted, "Queue closed, demo producer stopping");
                        break;
                    }
                }
            }
            accepted
        });
    }

    info!(items = demo.items, producers, "Demo load started");
    set
}
