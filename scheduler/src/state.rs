//! Scheduler state definitions.

/// Scheduler operational state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    /// Created, timer loop not started yet.
    Starting,
    /// Timer loop is running.
    Running,
    /// Shutdown requested, current cycle finishing.
    ShuttingDown,
    /// Timer loop has exited.
    Stopped,
}

impl SchedulerState {
    /// Check if the timer loop is active.
    pub fn is_running(&self) -> bool {
        matches!(self, SchedulerState::Running)
    }

    /// Check if the scheduler is in a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, SchedulerState::Stopped)
    }
}
