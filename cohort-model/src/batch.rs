use std::fmt;

use crate::contact::Contact;

/// Lifecycle states for one batch as the scheduler drives it.
///
/// `Failed` is reached directly from `Creating` when the destination cannot
/// be created; per-member failures do not move the batch here.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BatchState {
    Planned,
    Creating,
    PopulatingMembers,
    PromotingElevated,
    Finalizing,
    MessageSent,
    Failed,
}

impl fmt::Display for BatchState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BatchState::Planned => write!(f, "planned"),
            BatchState::Creating => write!(f, "creating"),
            BatchState::PopulatingMembers => write!(f, "populating"),
            BatchState::PromotingElevated => write!(f, "promoting"),
            BatchState::Finalizing => write!(f, "finalizing"),
            BatchState::MessageSent => write!(f, "message_sent"),
            BatchState::Failed => write!(f, "failed"),
        }
    }
}

/// One planned unit of work producing one destination group.
///
/// Invariants upheld by the planner: `members.len()` never exceeds the
/// configured capacity, `sequence_index` is contiguous from zero, and every
/// batch in a run carries the same `elevated_members` sequence.
#[derive(Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Batch {
    pub sequence_index: usize,
    pub label: String,
    pub members: Vec<Contact>,
    pub elevated_members: Vec<Contact>,
}

impl Batch {
    pub fn total_members(&self) -> usize {
        self.members.len() + self.elevated_members.len()
    }
}
