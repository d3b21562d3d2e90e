// Queued item identity

use chrono::{DateTime, Utc};
use std::fmt;
use uuid::Uuid;

/// Identifier assigned to a work item when it is accepted by the queue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ItemId(Uuid);

impl ItemId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for ItemId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Descriptor of an item sitting in the queue
///
/// Work items are consumed when executed, so peeking hands out this
/// snapshot instead of the item itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemInfo {
    pub id: ItemId,
    pub label: String,
    pub enqueued_at: DateTime<Utc>,
}

impl ItemInfo {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            id: ItemId::new(),
            label: label.into(),
            enqueued_at: Utc::now(),
        }
    }
}
