use std::fmt;

use crate::contact::Contact;

/// Final stage a contact reached within one batch.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum OutcomeStage {
    Added,
    Promoted,
    MessageSent,
    Failed,
}

impl fmt::Display for OutcomeStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutcomeStage::Added => write!(f, "added"),
            OutcomeStage::Promoted => write!(f, "promoted"),
            OutcomeStage::MessageSent => write!(f, "message_sent"),
            OutcomeStage::Failed => write!(f, "failed"),
        }
    }
}

/// Definitive record of what happened to one contact in one batch.
///
/// Recorded exactly once per attempted contact and immutable afterwards.
#[derive(Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Outcome {
    pub contact: Contact,
    pub stage: OutcomeStage,
    pub error_detail: Option<String>,
}

impl Outcome {
    pub fn added(contact: Contact) -> Self {
        Self {
            contact,
            stage: OutcomeStage::Added,
            error_detail: None,
        }
    }

    pub fn promoted(contact: Contact) -> Self {
        Self {
            contact,
            stage: OutcomeStage::Promoted,
            error_detail: None,
        }
    }

    pub fn failed(contact: Contact, detail: impl Into<String>) -> Self {
        Self {
            contact,
            stage: OutcomeStage::Failed,
            error_detail: Some(detail.into()),
        }
    }

    pub fn is_failed(&self) -> bool {
        self.stage == OutcomeStage::Failed
    }
}
