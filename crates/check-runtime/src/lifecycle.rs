//! Worker shutdown lifecycle.
//!
//! The module this is drawn from tracks shutdown with a single process-wide
//! mutable flag, `has_cleared`, checked and set from
//! `ngx_http_check_clear_all_events`. A bare bool can't tell a scheduler
//! that hasn't noticed shutdown yet from one that's mid-drain from one
//! that's fully stopped, so REDESIGN FLAG R3 replaces it with an explicit
//! three-state lifecycle owned by each worker's scheduler handle instead of
//! shared global mutable state.

use tokio::sync::watch;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    /// Scheduling probe cycles normally.
    Running,
    /// No new probe cycles are started; in-flight cycles are allowed to
    /// finish so a peer's counters aren't left mid-update.
    Stopping,
    /// Every scheduler task has observed `Stopping` and returned.
    Stopped,
}

/// A `watch`-backed handle for coordinating shutdown across a worker's
/// per-peer scheduler tasks. Cloning gives every task its own receiver;
/// [`WorkerLifecycle::begin_stop`] is called once, from the worker's signal
/// handler.
#[derive(Clone)]
pub struct WorkerLifecycle {
    tx: watch::Sender<WorkerState>,
}

impl WorkerLifecycle {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(WorkerState::Running);
        WorkerLifecycle { tx }
    }

    pub fn subscribe(&self) -> watch::Receiver<WorkerState> {
        self.tx.subscribe()
    }

    pub fn state(&self) -> WorkerState {
        *self.tx.borrow()
    }

    /// Moves every subscriber from `Running` to `Stopping`. Idempotent.
    pub fn begin_stop(&self) {
        let _ = self.tx.send_if_modified(|s| {
            if *s == WorkerState::Running {
                *s = WorkerState::Stopping;
                true
            } else {
                false
            }
        });
    }

    /// Marks the worker fully drained once every scheduler task has exited.
    pub fn mark_stopped(&self) {
        let _ = self.tx.send(WorkerState::Stopped);
    }
}

impl Default for WorkerLifecycle {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn begin_stop_moves_running_to_stopping_once() {
        let lc = WorkerLifecycle::new();
        assert_eq!(lc.state(), WorkerState::Running);
        lc.begin_stop();
        assert_eq!(lc.state(), WorkerState::Stopping);
        lc.begin_stop();
        assert_eq!(lc.state(), WorkerState::Stopping);
    }

    #[test]
    fn mark_stopped_is_reachable_from_stopping() {
        let lc = WorkerLifecycle::new();
        lc.begin_stop();
        lc.mark_stopped();
        assert_eq!(lc.state(), WorkerState::Stopped);
    }
}
