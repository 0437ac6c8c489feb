//! End-to-end runs of the scheduler against stub executors.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use cohort_core::{
    DelayRange, ExecutionError, GroupExecutor, GroupScheduler, PacingConfig, PacingPolicy,
    RunContext, plan_batches,
};
use cohort_core::{Roster, RosterOptions};
use cohort_model::{BatchState, Contact, ContactRole, DestinationHandle, OutcomeStage};

/// Scripted executor: records every call and fails on demand.
#[derive(Default)]
struct StubExecutor {
    created: Mutex<Vec<String>>,
    added: Mutex<Vec<String>>,
    promoted: Mutex<Vec<String>>,
    messages: Mutex<Vec<String>>,
    fail_adds_for: HashSet<String>,
    fail_creates_for: HashSet<String>,
    fail_messages: bool,
    cancel_after_adds: Option<(usize, RunContext)>,
    cancel_after_promotions: Option<(usize, RunContext)>,
}

#[async_trait]
impl GroupExecutor for StubExecutor {
    async fn create_destination(&self, label: &str) -> Result<DestinationHandle, ExecutionError> {
        self.created.lock().unwrap().push(label.to_string());
        if self.fail_creates_for.contains(label) {
            return Err(ExecutionError::new(format!("could not open menu for {label}")));
        }
        Ok(DestinationHandle::new(format!("dest:{label}"), label))
    }

    async fn add_member(
        &self,
        _destination: &DestinationHandle,
        contact: &Contact,
    ) -> Result<(), ExecutionError> {
        if self.fail_adds_for.contains(&contact.identifier) {
            return Err(ExecutionError::new("contact not found in search results"));
        }
        let mut added = self.added.lock().unwrap();
        added.push(contact.identifier.clone());
        if let Some((limit, context)) = &self.cancel_after_adds
            && added.len() >= *limit
        {
            context.cancel();
        }
        Ok(())
    }

    async fn promote(
        &self,
        _destination: &DestinationHandle,
        contact: &Contact,
    ) -> Result<(), ExecutionError> {
        let mut promoted = self.promoted.lock().unwrap();
        promoted.push(contact.identifier.clone());
        if let Some((limit, context)) = &self.cancel_after_promotions
            && promoted.len() >= *limit
        {
            context.cancel();
        }
        Ok(())
    }

    async fn send_message(
        &self,
        destination: &DestinationHandle,
        text: &str,
    ) -> Result<(), ExecutionError> {
        if self.fail_messages {
            return Err(ExecutionError::new("compose box never appeared"));
        }
        self.messages
            .lock()
            .unwrap()
            .push(format!("{}: {text}", destination.label));
        Ok(())
    }
}

fn contact(id: &str, role: ContactRole) -> Contact {
    Contact::new(None, id, role).unwrap()
}

fn regulars(count: usize) -> Vec<Contact> {
    (0..count)
        .map(|i| contact(&format!("55629999{i:04}"), ContactRole::Regular))
        .collect()
}

/// All ranges zero-width so runs finish without any real sleeping.
fn instant_pacing() -> PacingConfig {
    PacingConfig {
        inter_contact: DelayRange::ZERO,
        inter_batch: DelayRange::ZERO,
        ..PacingConfig::default()
    }
}

fn scheduler(
    executor: Arc<StubExecutor>,
    config: PacingConfig,
    context: RunContext,
) -> GroupScheduler<StubExecutor> {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
    let policy = PacingPolicy::seeded(config, 1).unwrap();
    GroupScheduler::new(executor, policy, context, Some("Welcome aboard!".to_string()))
}

#[tokio::test]
async fn full_run_adds_promotes_and_messages_every_batch() {
    let mut contacts = regulars(5);
    contacts.push(contact("admin-1", ContactRole::Elevated));
    contacts.push(contact("admin-2", ContactRole::Elevated));

    let roster = Roster::classify(contacts, RosterOptions::default());
    let batches = plan_batches(&roster, 2, "Group").unwrap();
    assert_eq!(batches.len(), 3);

    let executor = Arc::new(StubExecutor::default());
    let report = scheduler(executor.clone(), instant_pacing(), RunContext::new())
        .run(batches)
        .await;

    assert_eq!(report.summary.total_batches, 3);
    assert!(!report.summary.cancelled);
    // 5 regular adds + per-batch elevated (2 * 3 batches), all promoted.
    assert_eq!(report.summary.total_succeeded, 5 + 2 * 3);
    assert_eq!(report.summary.total_failed, 0);

    for summary in &report.batches {
        assert_eq!(summary.state, BatchState::MessageSent);
        assert!(summary.message_sent);
        assert!(summary.completed_at.is_some());
        assert_eq!(summary.elevated_outcomes.len(), 2);
        assert!(
            summary
                .elevated_outcomes
                .iter()
                .all(|o| o.stage == OutcomeStage::Promoted)
        );
    }

    assert_eq!(executor.created.lock().unwrap().len(), 3);
    assert_eq!(executor.promoted.lock().unwrap().len(), 6);
    assert_eq!(executor.messages.lock().unwrap().len(), 3);
}

#[tokio::test]
async fn one_failing_contact_does_not_abort_the_batch() {
    let contacts = regulars(6);
    let failing = contacts[2].identifier.clone();
    let roster = Roster::classify(contacts, RosterOptions::default());
    let batches = plan_batches(&roster, 10, "Group").unwrap();

    let executor = Arc::new(StubExecutor {
        fail_adds_for: HashSet::from([failing.clone()]),
        ..StubExecutor::default()
    });
    let report = scheduler(executor, instant_pacing(), RunContext::new())
        .run(batches)
        .await;

    let summary = &report.batches[0];
    assert_eq!(summary.member_outcomes.len(), 6);
    assert_eq!(summary.failed(), 1);
    assert_eq!(summary.succeeded(), 5);
    assert_eq!(summary.state, BatchState::MessageSent);

    let failed: Vec<_> = summary
        .member_outcomes
        .iter()
        .filter(|o| o.is_failed())
        .collect();
    assert_eq!(failed.len(), 1);
    assert_eq!(failed[0].contact.identifier, failing);
    assert!(
        failed[0]
            .error_detail
            .as_deref()
            .unwrap()
            .contains("not found")
    );
}

#[tokio::test]
async fn destination_failure_skips_only_that_batch() {
    let roster = Roster::classify(regulars(6), RosterOptions::default());
    let batches = plan_batches(&roster, 2, "Group").unwrap();
    assert_eq!(batches.len(), 3);

    let executor = Arc::new(StubExecutor {
        fail_creates_for: HashSet::from(["Group 2".to_string()]),
        ..StubExecutor::default()
    });
    let report = scheduler(executor.clone(), instant_pacing(), RunContext::new())
        .run(batches)
        .await;

    assert!(!report.summary.cancelled);
    assert_eq!(report.batches.len(), 3);
    assert_eq!(report.batches[0].state, BatchState::MessageSent);
    assert_eq!(report.batches[1].state, BatchState::Failed);
    assert!(report.batches[1].member_outcomes.is_empty());
    assert_eq!(report.batches[2].state, BatchState::MessageSent);

    // Batch 2's members were never attempted.
    assert_eq!(executor.added.lock().unwrap().len(), 4);
}

#[tokio::test]
async fn cancellation_mid_batch_preserves_recorded_outcomes() {
    let roster = Roster::classify(regulars(10), RosterOptions::default());
    let batches = plan_batches(&roster, 10, "Group").unwrap();

    let context = RunContext::new();
    let executor = Arc::new(StubExecutor {
        cancel_after_adds: Some((3, context.clone())),
        ..StubExecutor::default()
    });
    let report = scheduler(executor, instant_pacing(), context.clone())
        .run(batches)
        .await;

    assert!(report.summary.cancelled);
    assert_eq!(report.batches.len(), 1);

    let summary = &report.batches[0];
    assert_eq!(summary.member_outcomes.len(), 3);
    assert!(summary.member_outcomes.iter().all(|o| !o.is_failed()));
    // Interrupted, not failed.
    assert_eq!(summary.state, BatchState::PopulatingMembers);
    assert_eq!(context.snapshot().current_step, "cancelled");
}

#[tokio::test]
async fn cancellation_mid_promotion_keeps_added_outcomes() {
    let mut contacts = regulars(1);
    contacts.push(contact("admin-1", ContactRole::Elevated));
    contacts.push(contact("admin-2", ContactRole::Elevated));
    let roster = Roster::classify(contacts, RosterOptions::default());
    let batches = plan_batches(&roster, 10, "Group").unwrap();

    let context = RunContext::new();
    let executor = Arc::new(StubExecutor {
        cancel_after_promotions: Some((1, context.clone())),
        ..StubExecutor::default()
    });
    let report = scheduler(executor.clone(), instant_pacing(), context)
        .run(batches)
        .await;

    assert!(report.summary.cancelled);
    let summary = &report.batches[0];
    // Both admins were added on the platform; the one the cancellation
    // caught before promotion still shows up, at the stage it reached.
    assert_eq!(
        summary.elevated_outcomes.len(),
        2,
        "every attempted contact must be recorded"
    );
    assert_eq!(summary.elevated_outcomes[0].stage, OutcomeStage::Promoted);
    assert_eq!(summary.elevated_outcomes[0].contact.identifier, "admin-1");
    assert_eq!(summary.elevated_outcomes[1].stage, OutcomeStage::Added);
    assert_eq!(summary.elevated_outcomes[1].contact.identifier, "admin-2");
    assert_eq!(executor.promoted.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn elevated_add_failure_records_outcome_and_skips_promotion() {
    let mut contacts = regulars(2);
    contacts.push(contact("admin-1", ContactRole::Elevated));
    contacts.push(contact("admin-2", ContactRole::Elevated));
    let roster = Roster::classify(contacts, RosterOptions::default());
    let batches = plan_batches(&roster, 10, "Group").unwrap();

    let executor = Arc::new(StubExecutor {
        fail_adds_for: HashSet::from(["admin-1".to_string()]),
        ..StubExecutor::default()
    });
    let report = scheduler(executor.clone(), instant_pacing(), RunContext::new())
        .run(batches)
        .await;

    let summary = &report.batches[0];
    assert_eq!(summary.state, BatchState::MessageSent);
    assert_eq!(summary.elevated_outcomes.len(), 2);
    assert_eq!(summary.elevated_outcomes[0].stage, OutcomeStage::Failed);
    assert_eq!(summary.elevated_outcomes[0].contact.identifier, "admin-1");
    assert_eq!(summary.elevated_outcomes[1].stage, OutcomeStage::Promoted);
    assert_eq!(summary.failed(), 1);

    // The failed add never reaches the promotion step.
    assert_eq!(*executor.promoted.lock().unwrap(), vec!["admin-2".to_string()]);
}

#[tokio::test(start_paused = true)]
async fn cancellation_during_cooldown_clears_the_flag() {
    let roster = Roster::classify(regulars(4), RosterOptions::default());
    let batches = plan_batches(&roster, 2, "Group").unwrap();
    assert_eq!(batches.len(), 2);

    let config = PacingConfig {
        max_batches_per_window: 1,
        cooldown_secs: 1_200,
        ..instant_pacing()
    };
    let context = RunContext::new();
    let executor = Arc::new(StubExecutor::default());
    let handle = tokio::spawn(scheduler(executor, config, context.clone()).run(batches));

    // Batch 1 finishes instantly, so the scheduler is parked in the
    // cooldown before batch 2 when this timer fires.
    tokio::time::sleep(Duration::from_secs(1)).await;
    context.cancel();

    let report = handle.await.unwrap();
    assert!(report.summary.cancelled);
    assert_eq!(report.batches.len(), 1);

    let status = context.snapshot();
    assert!(!status.cooldown_active, "finished run must not report an active cooldown");
    assert_eq!(status.current_step, "cancelled");
}

#[tokio::test]
async fn lost_welcome_message_leaves_batch_in_finalizing() {
    let roster = Roster::classify(regulars(2), RosterOptions::default());
    let batches = plan_batches(&roster, 10, "Group").unwrap();

    let executor = Arc::new(StubExecutor {
        fail_messages: true,
        ..StubExecutor::default()
    });
    let report = scheduler(executor, instant_pacing(), RunContext::new())
        .run(batches)
        .await;

    let summary = &report.batches[0];
    assert!(!summary.message_sent);
    assert_eq!(summary.state, BatchState::Finalizing);
    assert_eq!(summary.failed(), 0);
}

#[tokio::test(start_paused = true)]
async fn session_window_cooldown_pauses_between_batches() {
    let roster = Roster::classify(regulars(6), RosterOptions::default());
    let batches = plan_batches(&roster, 2, "Group").unwrap();

    let config = PacingConfig {
        max_batches_per_window: 1,
        cooldown_secs: 1_200,
        ..instant_pacing()
    };
    let executor = Arc::new(StubExecutor::default());
    let context = RunContext::new();
    let report = scheduler(executor.clone(), config, context.clone())
        .run(batches)
        .await;

    // Two cooldowns elapsed (before batches 2 and 3) under virtual time and
    // the run still completed everything.
    assert_eq!(report.summary.total_batches, 3);
    assert!(!report.summary.cancelled);
    assert_eq!(executor.created.lock().unwrap().len(), 3);

    let status = context.snapshot();
    assert!(!status.cooldown_active);
    assert_eq!(status.batches_completed, 3);
}

#[tokio::test]
async fn status_snapshot_tracks_progress() {
    let mut contacts = regulars(3);
    contacts.push(contact("admin-1", ContactRole::Elevated));
    let roster = Roster::classify(contacts, RosterOptions::default());
    let batches = plan_batches(&roster, 10, "Group").unwrap();

    let context = RunContext::new();
    let executor = Arc::new(StubExecutor::default());
    scheduler(executor, instant_pacing(), context.clone())
        .run(batches)
        .await;

    let status = context.snapshot();
    assert_eq!(status.members_added, 4);
    assert_eq!(status.members_promoted, 1);
    assert_eq!(status.failures, 0);
    assert_eq!(status.batches_completed, 1);
    assert_eq!(status.current_step, "complete");
}
