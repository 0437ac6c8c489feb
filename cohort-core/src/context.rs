use std::sync::{Arc, RwLock};

use serde::Serialize;
use tokio_util::sync::CancellationToken;

/// Point-in-time view of a run, safe to hand to a polling status endpoint.
#[derive(Clone, Debug, Default, Serialize)]
pub struct RunStatus {
    pub current_step: String,
    pub current_batch: Option<String>,
    pub batches_completed: usize,
    pub members_added: usize,
    pub members_promoted: usize,
    pub failures: usize,
    pub batches_in_window: u32,
    pub cooldown_active: bool,
}

/// Shared handle between the scheduler and whoever supervises it.
///
/// Owns the cancellation token and the status cell. Clones are cheap and
/// all observe the same run; the HTTP layer (or CLI) keeps one clone for
/// polling and cancellation while the scheduler mutates through its own.
#[derive(Clone, Debug, Default)]
pub struct RunContext {
    cancel: CancellationToken,
    status: Arc<RwLock<RunStatus>>,
}

impl RunContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests early termination. The scheduler honours this before each
    /// batch, before each contact action, and inside every delay.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Cloned snapshot of the current status.
    pub fn snapshot(&self) -> RunStatus {
        match self.status.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub(crate) fn update(&self, apply: impl FnOnce(&mut RunStatus)) {
        match self.status.write() {
            Ok(mut guard) => apply(&mut guard),
            Err(poisoned) => apply(&mut poisoned.into_inner()),
        }
    }
}
