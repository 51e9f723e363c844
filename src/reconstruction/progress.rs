use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::watch;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    Running,
    Completed,
    Cancelled,
}

/// Observable state of the controller's current run. Progress is in [0, 1]
/// and non-decreasing within one generation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunStatus {
    pub generation: u64,
    pub state: RunState,
    pub progress: f32,
}

impl RunStatus {
    pub fn idle() -> Self {
        Self {
            generation: 0,
            state: RunState::Idle,
            progress: 0.0,
        }
    }

    pub fn is_animating(&self) -> bool {
        self.state == RunState::Running
    }
}

/// Progress channel for a single run generation.
///
/// A superseded run keeps its reporter, but every send compares the
/// reporter's generation against the live one and drops stale updates. That
/// identity check, not a shared boolean, is what keeps a cancelled run's
/// late callbacks from leaking into the next run's progress stream.
#[derive(Debug, Clone)]
pub struct ProgressReporter {
    generation: u64,
    live_generation: Arc<AtomicU64>,
    tx: watch::Sender<RunStatus>,
}

impl ProgressReporter {
    pub(crate) fn new(
        generation: u64,
        live_generation: Arc<AtomicU64>,
        tx: watch::Sender<RunStatus>,
    ) -> Self {
        Self {
            generation,
            live_generation,
            tx,
        }
    }

    /// Reporter wired to its own channel, for driving a reconstructor
    /// directly without a controller.
    pub fn standalone() -> (Self, watch::Receiver<RunStatus>) {
        let (tx, rx) = watch::channel(RunStatus::idle());
        let live_generation = Arc::new(AtomicU64::new(1));
        (Self::new(1, live_generation, tx), rx)
    }

    pub fn report(&self, progress: f32) {
        self.send(RunState::Running, progress);
    }

    pub(crate) fn complete(&self) {
        self.send(RunState::Completed, 1.0);
    }

    fn send(&self, state: RunState, progress: f32) {
        if self.live_generation.load(Ordering::SeqCst) != self.generation {
            return;
        }
        // send only fails when every receiver is gone, which is fine
        let _ = self.tx.send(RunStatus {
            generation: self.generation,
            state,
            progress,
        });
    }
}
