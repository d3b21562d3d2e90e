// Worker constants (no magic values)
use std::time::Duration;

/// Default upper bound a host waits for workers during shutdown (5 seconds)
pub const DEFAULT_STOP_TIMEOUT: Duration = Duration::from_secs(5);

/// Items slower than this are logged at `info` when they finish (30 seconds)
pub const SLOW_ITEM_THRESHOLD: Duration = Duration::from_secs(30);
