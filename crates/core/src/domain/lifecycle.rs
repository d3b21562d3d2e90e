// Processor lifecycle state

use std::fmt;

/// Processor lifecycle
///
/// `Starting -> Running -> Stopping -> Stopped`. A processor stopped before it
/// was started goes `Starting -> Stopping -> Stopped`. `Stopped` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProcessorState {
    Starting,
    Running,
    Stopping,
    Stopped,
}

impl ProcessorState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProcessorState::Starting => "STARTING",
            ProcessorState::Running => "RUNNING",
            ProcessorState::Stopping => "STOPPING",
            ProcessorState::Stopped => "STOPPED",
        }
    }

    /// Whether `self -> next` is a legal lifecycle step
    pub fn can_transition_to(&self, next: ProcessorState) -> bool {
        use ProcessorState::*;
        matches!(
            (self, next),
            (Starting, Running) | (Starting, Stopping) | (Running, Stopping) | (Stopping, Stopped)
        )
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, ProcessorState::Stopped)
    }
}

impl fmt::Display for ProcessorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
