use cohort_model::Batch;

use crate::error::{Result, SchedulerError};
use crate::roster::Roster;

/// Partitions the regular contact pool into capacity-bounded batches.
///
/// Always yields at least one batch so elevated-only runs still produce a
/// destination. Every batch carries the full elevated sequence; labels are
/// `"{base_name} {n}"` numbered from 1.
pub fn plan_batches(roster: &Roster, capacity: usize, base_name: &str) -> Result<Vec<Batch>> {
    if capacity == 0 {
        return Err(SchedulerError::InvalidConfiguration(
            "batch capacity must be greater than zero".to_string(),
        ));
    }

    let batch_count = roster.regular.len().div_ceil(capacity).max(1);
    let mut batches = Vec::with_capacity(batch_count);

    for index in 0..batch_count {
        let start = index * capacity;
        let end = ((index + 1) * capacity).min(roster.regular.len());
        let members = roster.regular.get(start..end).unwrap_or_default().to_vec();

        batches.push(Batch {
            sequence_index: index,
            label: format!("{base_name} {}", index + 1),
            members,
            elevated_members: roster.elevated.clone(),
        });
    }

    tracing::debug!(
        target: "cohort::plan",
        batches = batch_count,
        regular = roster.regular.len(),
        elevated = roster.elevated.len(),
        capacity,
        "planned contact batches"
    );

    Ok(batches)
}
