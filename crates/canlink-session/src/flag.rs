use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Shared cancellation flag polled by the session tasks.
///
/// Starts out running. [`stop`](Self::stop) is the only transition and it is
/// never undone. Stopping is a single atomic store, so it is safe to call from
/// a signal-handling context.
#[derive(Debug, Clone)]
pub struct RunningFlag(Arc<AtomicBool>);

impl RunningFlag {
    pub fn new() -> Self {
        Self(Arc::new(AtomicBool::new(true)))
    }

    pub fn is_running(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// Clear the flag. Tasks exit after their current wait or read.
    pub fn stop(&self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

impl Default for RunningFlag {
    fn default() -> Self {
        Self::new()
    }
}

/// Clears the flag when dropped, so a task that unwinds also stops its
/// sibling.
pub(crate) struct StopOnExit(pub(crate) RunningFlag);

impl Drop for StopOnExit {
    fn drop(&mut self) {
        self.0.stop();
    }
}
