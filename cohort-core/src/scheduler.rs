use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use cohort_model::{Batch, BatchState, BatchSummary, Contact, Outcome, RunId, RunReport};
use tokio_util::sync::CancellationToken;

use crate::context::RunContext;
use crate::executor::GroupExecutor;
use crate::pacing::PacingPolicy;

/// Drives planned batches through the executor boundary, strictly
/// sequentially, with every action gated by the pacing policy.
///
/// Failure policy: a member-level [`ExecutionError`](crate::ExecutionError)
/// records a `failed` outcome and the batch continues; a destination
/// creation failure marks that batch `Failed` and the run continues with
/// the next batch; cancellation stops the run at the next check point and
/// the partial report stays valid.
pub struct GroupScheduler<E> {
    executor: Arc<E>,
    policy: PacingPolicy,
    context: RunContext,
    welcome_message: Option<String>,
}

impl<E: std::fmt::Debug> std::fmt::Debug for GroupScheduler<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GroupScheduler")
            .field("executor", &self.executor)
            .field("policy", &self.policy)
            .field("welcome_message_set", &self.welcome_message.is_some())
            .finish()
    }
}

impl<E: GroupExecutor> GroupScheduler<E> {
    pub fn new(
        executor: Arc<E>,
        policy: PacingPolicy,
        context: RunContext,
        welcome_message: Option<String>,
    ) -> Self {
        Self {
            executor,
            policy,
            context,
            welcome_message: welcome_message.filter(|text| !text.trim().is_empty()),
        }
    }

    pub fn context(&self) -> &RunContext {
        &self.context
    }

    /// Executes the full plan and returns the report, consuming the
    /// scheduler. Never returns an error: partial progress is a valid
    /// result, and per-item failures live inside the report.
    pub async fn run(mut self, batches: Vec<Batch>) -> RunReport {
        let run_id = RunId::new();
        let started = Instant::now();
        let cancel = self.context.cancellation_token();
        let total_batches = batches.len();
        let mut summaries = Vec::with_capacity(total_batches);
        let mut cancelled = false;

        tracing::info!(
            target: "cohort::scheduler",
            %run_id,
            batches = total_batches,
            "starting provisioning run"
        );

        for batch in &batches {
            if cancel.is_cancelled() {
                cancelled = true;
                break;
            }

            if self.policy.should_cooldown() {
                self.context.update(|status| {
                    status.current_step = "cooldown".to_string();
                    status.cooldown_active = true;
                });
                tokio::select! {
                    _ = cancel.cancelled() => {
                        self.context.update(|status| status.cooldown_active = false);
                        cancelled = true;
                        break;
                    }
                    _ = self.policy.enter_cooldown() => {}
                }
                let session = self.policy.session();
                self.context.update(|status| {
                    status.cooldown_active = session.cooldown_active;
                    status.batches_in_window = session.batches_completed_in_window;
                });
            }

            let (summary, batch_cancelled) = self.process_batch(batch, &cancel).await;
            summaries.push(summary);
            if batch_cancelled {
                cancelled = true;
                break;
            }

            self.policy.record_batch_completed();
            let session = self.policy.session();
            self.context.update(|status| {
                status.batches_completed += 1;
                status.batches_in_window = session.batches_completed_in_window;
            });

            let is_last = batch.sequence_index + 1 == total_batches;
            let delay = self.policy.inter_batch_delay(is_last);
            if !delay.is_zero() {
                tracing::debug!(
                    target: "cohort::scheduler",
                    batch = %batch.label,
                    delay_secs = delay.as_secs_f64(),
                    "inter-batch delay"
                );
                tokio::select! {
                    _ = cancel.cancelled() => {
                        cancelled = true;
                        break;
                    }
                    _ = tokio::time::sleep(delay) => {}
                }
            }
        }

        let report = RunReport::new(run_id, summaries, started.elapsed(), cancelled);
        self.context.update(|status| {
            status.current_batch = None;
            status.current_step = if cancelled {
                "cancelled".to_string()
            } else {
                "complete".to_string()
            };
        });
        tracing::info!(
            target: "cohort::scheduler",
            %run_id,
            batches = report.summary.total_batches,
            succeeded = report.summary.total_succeeded,
            failed = report.summary.total_failed,
            cancelled,
            elapsed_secs = report.summary.elapsed.as_secs_f64(),
            "provisioning run finished"
        );
        report
    }

    /// Runs one batch end to end. Returns the summary plus whether
    /// cancellation interrupted it.
    async fn process_batch(
        &mut self,
        batch: &Batch,
        cancel: &CancellationToken,
    ) -> (BatchSummary, bool) {
        let mut summary = BatchSummary::planned(&batch.label);
        self.context.update(|status| {
            status.current_batch = Some(batch.label.clone());
            status.current_step = format!("creating {}", batch.label);
        });
        tracing::info!(
            target: "cohort::scheduler",
            batch = %batch.label,
            members = batch.members.len(),
            elevated = batch.elevated_members.len(),
            "processing batch"
        );

        summary.state = BatchState::Creating;
        let destination = match self.executor.create_destination(&batch.label).await {
            Ok(handle) => handle,
            Err(err) => {
                tracing::warn!(
                    target: "cohort::scheduler",
                    batch = %batch.label,
                    error = %err,
                    "destination creation failed, skipping batch"
                );
                summary.state = BatchState::Failed;
                summary.completed_at = Some(Utc::now());
                return (summary, false);
            }
        };

        summary.state = BatchState::PopulatingMembers;
        self.context
            .update(|status| status.current_step = format!("populating {}", batch.label));

        for contact in &batch.members {
            if cancel.is_cancelled() {
                return (summary, true);
            }
            if self.pace_contact(cancel).await {
                return (summary, true);
            }
            match self.executor.add_member(&destination, contact).await {
                Ok(()) => {
                    summary.member_outcomes.push(Outcome::added(contact.clone()));
                    self.context.update(|status| status.members_added += 1);
                }
                Err(err) => {
                    tracing::warn!(
                        target: "cohort::scheduler",
                        batch = %batch.label,
                        identifier = %contact.identifier,
                        error = %err,
                        "member add failed"
                    );
                    summary
                        .member_outcomes
                        .push(Outcome::failed(contact.clone(), err.to_string()));
                    self.context.update(|status| status.failures += 1);
                }
            }
        }

        // Elevated contacts join as members first; promotion happens once
        // the destination is fully populated. Each successful add records an
        // `Added` outcome immediately so cancellation before promotion still
        // leaves every attempted contact in the output; the promotion loop
        // upgrades that slot in place.
        let mut promotable: Vec<(usize, &Contact)> =
            Vec::with_capacity(batch.elevated_members.len());
        for contact in &batch.elevated_members {
            if cancel.is_cancelled() {
                return (summary, true);
            }
            if self.pace_contact(cancel).await {
                return (summary, true);
            }
            match self.executor.add_member(&destination, contact).await {
                Ok(()) => {
                    summary
                        .elevated_outcomes
                        .push(Outcome::added(contact.clone()));
                    promotable.push((summary.elevated_outcomes.len() - 1, contact));
                    self.context.update(|status| status.members_added += 1);
                }
                Err(err) => {
                    tracing::warn!(
                        target: "cohort::scheduler",
                        batch = %batch.label,
                        identifier = %contact.identifier,
                        error = %err,
                        "elevated member add failed"
                    );
                    summary
                        .elevated_outcomes
                        .push(Outcome::failed(contact.clone(), err.to_string()));
                    self.context.update(|status| status.failures += 1);
                }
            }
        }

        summary.state = BatchState::PromotingElevated;
        self.context
            .update(|status| status.current_step = format!("promoting in {}", batch.label));

        for (slot, contact) in promotable {
            if cancel.is_cancelled() {
                return (summary, true);
            }
            if self.pace_contact(cancel).await {
                return (summary, true);
            }
            match self.executor.promote(&destination, contact).await {
                Ok(()) => {
                    summary.elevated_outcomes[slot] = Outcome::promoted(contact.clone());
                    self.context.update(|status| status.members_promoted += 1);
                }
                Err(err) => {
                    tracing::warn!(
                        target: "cohort::scheduler",
                        batch = %batch.label,
                        identifier = %contact.identifier,
                        error = %err,
                        "promotion failed"
                    );
                    summary.elevated_outcomes[slot] =
                        Outcome::failed(contact.clone(), format!("promotion failed: {err}"));
                    self.context.update(|status| status.failures += 1);
                }
            }
        }

        summary.state = BatchState::Finalizing;
        self.context
            .update(|status| status.current_step = format!("finalizing {}", batch.label));

        let mut message_failed = false;
        if let Some(text) = &self.welcome_message {
            match self.executor.send_message(&destination, text).await {
                Ok(()) => summary.message_sent = true,
                Err(err) => {
                    tracing::warn!(
                        target: "cohort::scheduler",
                        batch = %batch.label,
                        error = %err,
                        "welcome message failed"
                    );
                    message_failed = true;
                }
            }
        }

        // A lost welcome message leaves the batch in Finalizing; members
        // and promotions already landed, so the batch is not Failed.
        if !message_failed {
            summary.state = BatchState::MessageSent;
        }
        summary.completed_at = Some(Utc::now());

        tracing::info!(
            target: "cohort::scheduler",
            batch = %batch.label,
            state = %summary.state,
            succeeded = summary.succeeded(),
            failed = summary.failed(),
            message_sent = summary.message_sent,
            "batch finished"
        );
        (summary, false)
    }

    /// Applies the inter-contact delay, racing it against cancellation.
    /// Returns true when the run should stop.
    async fn pace_contact(&mut self, cancel: &CancellationToken) -> bool {
        let delay = self.policy.inter_contact_delay();
        if delay.is_zero() {
            return false;
        }
        tokio::select! {
            _ = cancel.cancelled() => true,
            _ = tokio::time::sleep(delay) => false,
        }
    }
}
