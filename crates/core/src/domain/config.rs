// Processor configuration

use super::error::{DomainError, Result};
use serde::Deserialize;

/// Default bound on buffered items
pub const DEFAULT_QUEUE_CAPACITY: usize = 100;

/// Default number of concurrent draining workers
pub const DEFAULT_WORKER_COUNT: usize = 1;

/// Immutable processor configuration
///
/// Both values are positive and fixed for the lifetime of the processor.
/// `queue_capacity` should be sized for the expected load and the number of
/// concurrent producers: once it is reached, every further `enqueue` waits
/// for a slot, which pushes back on publishers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(try_from = "RawProcessorConfig")]
pub struct ProcessorConfig {
    queue_capacity: usize,
    worker_count: usize,
}

impl ProcessorConfig {
    pub fn new(queue_capacity: usize, worker_count: usize) -> Result<Self> {
        if queue_capacity == 0 {
            return Err(DomainError::InvalidConfig(
                "queue_capacity must be positive".to_string(),
            ));
        }
        if worker_count == 0 {
            return Err(DomainError::InvalidConfig(
                "worker_count must be positive".to_string(),
            ));
        }
        Ok(Self {
            queue_capacity,
            worker_count,
        })
    }

    pub fn queue_capacity(&self) -> usize {
        self.queue_capacity
    }

    pub fn worker_count(&self) -> usize {
        self.worker_count
    }
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        Self {
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            worker_count: DEFAULT_WORKER_COUNT,
        }
    }
}

#[derive(Deserialize)]
struct RawProcessorConfig {
    #[serde(default = "default_queue_capacity")]
    queue_capacity: usize,
    #[serde(default = "default_worker_count")]
    worker_count: usize,
}

fn default_queue_capacity() -> usize {
    DEFAULT_QUEUE_CAPACITY
}

fn default_worker_count() -> usize {
    DEFAULT_WORKER_COUNT
}

impl TryFrom<RawProcessorConfig> for ProcessorConfig {
    type Error = DomainError;

    fn try_from(raw: RawProcessorConfig) -> Result<Self> {
        ProcessorConfig::new(raw.queue_capacity, raw.worker_count)
    }
}
