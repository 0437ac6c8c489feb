//! Core data model definitions shared across Cohort crates.
#![allow(missing_docs)]

pub mod batch;
pub mod contact;
pub mod destination;
pub mod error;
pub mod ids;
pub mod outcome;
pub mod report;

// Intentionally curated re-exports for downstream consumers.
pub use batch::{Batch, BatchState};
pub use contact::{Contact, ContactRole};
pub use destination::DestinationHandle;
pub use error::{ModelError, Result as ModelResult};
pub use ids::RunId;
pub use outcome::{Outcome, OutcomeStage};
pub use report::{BatchSummary, RunReport, RunSummary};
