use async_trait::async_trait;
use cohort_model::{Contact, DestinationHandle};
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::error::{ExecutionError, Result};
use crate::pacing::DelayRange;

/// External collaborator performing the actual platform actions.
///
/// Implementations own everything UI-shaped: selector probing, typing
/// cadence, per-call timeouts. Each method reports a single
/// [`ExecutionError`] on failure; the scheduler turns those into recorded
/// outcomes and keeps going.
#[async_trait]
pub trait GroupExecutor: Send + Sync {
    /// Creates the destination group for one batch.
    async fn create_destination(
        &self,
        label: &str,
    ) -> std::result::Result<DestinationHandle, ExecutionError>;

    /// Adds one contact to the destination's member list.
    async fn add_member(
        &self,
        destination: &DestinationHandle,
        contact: &Contact,
    ) -> std::result::Result<(), ExecutionError>;

    /// Grants administrator rights to an already-added contact.
    async fn promote(
        &self,
        destination: &DestinationHandle,
        contact: &Contact,
    ) -> std::result::Result<(), ExecutionError>;

    /// Posts the welcome message into the destination.
    async fn send_message(
        &self,
        destination: &DestinationHandle,
        text: &str,
    ) -> std::result::Result<(), ExecutionError>;
}

/// Bounded retry budget for flaky per-member operations.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff: DelayRange,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff: DelayRange::new(2.0, 5.0),
        }
    }
}

impl RetryPolicy {
    pub fn validate(&self) -> Result<()> {
        if self.max_attempts == 0 {
            return Err(crate::error::SchedulerError::InvalidConfiguration(
                "retry max_attempts must be at least 1".to_string(),
            ));
        }
        self.backoff.validate("retry backoff")
    }
}

#[derive(Clone, Copy)]
enum MemberOp {
    Add,
    Promote,
}

impl MemberOp {
    fn name(self) -> &'static str {
        match self {
            MemberOp::Add => "add_member",
            MemberOp::Promote => "promote",
        }
    }
}

/// Wraps an executor with an explicit, iterative retry loop for the two
/// member-level operations.
///
/// Destination creation and message sending stay single-shot: re-driving
/// either against a half-created group duplicates visible platform actions,
/// while re-searching a contact is idempotent.
#[derive(Debug)]
pub struct RetryingExecutor<E> {
    inner: E,
    policy: RetryPolicy,
    rng: Mutex<StdRng>,
}

impl<E: GroupExecutor> RetryingExecutor<E> {
    pub fn new(inner: E, policy: RetryPolicy) -> Result<Self> {
        policy.validate()?;
        Ok(Self {
            inner,
            policy,
            rng: Mutex::new(StdRng::from_os_rng()),
        })
    }

    pub fn seeded(inner: E, policy: RetryPolicy, seed: u64) -> Result<Self> {
        policy.validate()?;
        Ok(Self {
            inner,
            policy,
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        })
    }

    pub fn into_inner(self) -> E {
        self.inner
    }

    async fn call_once(
        &self,
        op: MemberOp,
        destination: &DestinationHandle,
        contact: &Contact,
    ) -> std::result::Result<(), ExecutionError> {
        match op {
            MemberOp::Add => self.inner.add_member(destination, contact).await,
            MemberOp::Promote => self.inner.promote(destination, contact).await,
        }
    }

    async fn call_with_retry(
        &self,
        op: MemberOp,
        destination: &DestinationHandle,
        contact: &Contact,
    ) -> std::result::Result<(), ExecutionError> {
        let mut last_error = None;
        for attempt in 1..=self.policy.max_attempts {
            match self.call_once(op, destination, contact).await {
                Ok(()) => return Ok(()),
                Err(err) => {
                    tracing::warn!(
                        target: "cohort::executor",
                        operation = op.name(),
                        attempt,
                        max_attempts = self.policy.max_attempts,
                        identifier = %contact.identifier,
                        error = %err,
                        "executor call failed"
                    );
                    last_error = Some(err);
                }
            }
            if attempt < self.policy.max_attempts {
                let backoff = {
                    let mut rng = self.rng.lock().await;
                    self.policy.backoff.sample(&mut *rng)
                };
                tokio::time::sleep(backoff).await;
            }
        }
        Err(last_error
            .unwrap_or_else(|| ExecutionError::new("retry budget exhausted before first attempt")))
    }
}

#[async_trait]
impl<E: GroupExecutor> GroupExecutor for RetryingExecutor<E> {
    async fn create_destination(
        &self,
        label: &str,
    ) -> std::result::Result<DestinationHandle, ExecutionError> {
        self.inner.create_destination(label).await
    }

    async fn add_member(
        &self,
        destination: &DestinationHandle,
        contact: &Contact,
    ) -> std::result::Result<(), ExecutionError> {
        self.call_with_retry(MemberOp::Add, destination, contact)
            .await
    }

    async fn promote(
        &self,
        destination: &DestinationHandle,
        contact: &Contact,
    ) -> std::result::Result<(), ExecutionError> {
        self.call_with_retry(MemberOp::Promote, destination, contact)
            .await
    }

    async fn send_message(
        &self,
        destination: &DestinationHandle,
        text: &str,
    ) -> std::result::Result<(), ExecutionError> {
        self.inner.send_message(destination, text).await
    }
}
