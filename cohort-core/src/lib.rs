//! Contact batching and anti-detection pacing for bulk group provisioning.
//!
//! The core pipeline: [`Roster::classify`] splits an uploaded contact list
//! into regular and elevated roles, [`plan_batches`] partitions the regular
//! pool into capacity-bounded batches, and [`GroupScheduler::run`] drives
//! each batch through an injected [`GroupExecutor`] with every action gated
//! by the [`PacingPolicy`]. Browser/UI mechanics live entirely behind the
//! executor boundary.

pub mod context;
pub mod error;
pub mod executor;
pub mod pacing;
pub mod plan;
pub mod roster;
pub mod scheduler;

pub use context::{RunContext, RunStatus};
pub use error::{ExecutionError, Result, SchedulerError};
pub use executor::{GroupExecutor, RetryPolicy, RetryingExecutor};
pub use pacing::{DelayRange, PacingConfig, PacingPolicy, SessionState};
pub use plan::plan_batches;
pub use roster::{Roster, RosterOptions};
pub use scheduler::GroupScheduler;

pub use cohort_model as model;
