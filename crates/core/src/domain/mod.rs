// Domain Layer - Queue entities, configuration and lifecycle

pub mod config;
pub mod error;
pub mod item;
pub mod lifecycle;
pub mod shutdown;

// Re-exports
pub use config::ProcessorConfig;
pub use error::{DomainError, QueueError};
pub use item::{ItemId, ItemInfo};
pub use lifecycle::ProcessorState;
pub use shutdown::{shutdown_channel, ShutdownSender, ShutdownToken};
