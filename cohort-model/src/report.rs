use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::batch::BatchState;
use crate::ids::RunId;
use crate::outcome::Outcome;

/// Per-batch record emitted by the scheduler.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BatchSummary {
    pub label: String,
    pub state: BatchState,
    pub member_outcomes: Vec<Outcome>,
    pub elevated_outcomes: Vec<Outcome>,
    pub message_sent: bool,
    pub completed_at: Option<DateTime<Utc>>,
}

impl BatchSummary {
    pub fn planned(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            state: BatchState::Planned,
            member_outcomes: Vec::new(),
            elevated_outcomes: Vec::new(),
            message_sent: false,
            completed_at: None,
        }
    }

    fn outcomes(&self) -> impl Iterator<Item = &Outcome> {
        self.member_outcomes
            .iter()
            .chain(self.elevated_outcomes.iter())
    }

    pub fn succeeded(&self) -> usize {
        self.outcomes().filter(|o| !o.is_failed()).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes().filter(|o| o.is_failed()).count()
    }
}

/// Whole-run totals.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RunSummary {
    pub run_id: RunId,
    pub total_batches: usize,
    pub total_succeeded: usize,
    pub total_failed: usize,
    pub elapsed: Duration,
    pub cancelled: bool,
}

/// Everything a reporting collaborator needs to render CSV/JSON output.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RunReport {
    pub summary: RunSummary,
    pub batches: Vec<BatchSummary>,
}

impl RunReport {
    pub fn new(
        run_id: RunId,
        batches: Vec<BatchSummary>,
        elapsed: Duration,
        cancelled: bool,
    ) -> Self {
        let total_succeeded = batches.iter().map(BatchSummary::succeeded).sum();
        let total_failed = batches.iter().map(BatchSummary::failed).sum();
        Self {
            summary: RunSummary {
                run_id,
                total_batches: batches.len(),
                total_succeeded,
                total_failed,
                elapsed,
                cancelled,
            },
            batches,
        }
    }
}
