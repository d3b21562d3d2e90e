// Port Layer - Interfaces implemented by work item authors

pub mod work_item;

// Re-exports
pub use work_item::{FnWorkItem, WorkItem, WorkItemError, WorkResult};
