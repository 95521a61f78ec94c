//! Fold a job's tasks and micros into aggregate keyspace totals and rate.

use std::time::Duration;

use crate::keyspace::{KeyspaceParseError, KeyspaceValue};
use crate::model::Task;

use super::staleness::is_fresh;

/// Aggregate totals for one snapshot of a job.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProgressTotals {
    pub total_keyspace: KeyspaceValue,
    pub completed_keyspace: KeyspaceValue,
    pub in_progress_keyspace: KeyspaceValue,
    /// Micros with a fresh status report.
    pub active_devices: usize,
    /// Hashes per second across all fresh micros.
    pub speed_per_sec: KeyspaceValue,
}

/// Modifier-scaled keyspace of one task.
struct ScaledTask {
    total: KeyspaceValue,
    completed: KeyspaceValue,
    in_progress: KeyspaceValue,
}

fn scale_task(task: &Task) -> Result<ScaledTask, KeyspaceParseError> {
    let modifier = KeyspaceValue::parse(&task.modifier)?;
    Ok(ScaledTask {
        total: KeyspaceValue::parse(&task.keyspace)?.scaled_by(&modifier),
        completed: KeyspaceValue::parse(&task.keyspace_completed)?.scaled_by(&modifier),
        in_progress: KeyspaceValue::parse(&task.keyspace_in_progress)?.scaled_by(&modifier),
    })
}

/// Reduce `tasks` to aggregate totals as of `now` (Unix seconds).
///
/// A task with a malformed keyspace or modifier contributes nothing to the
/// keyspace totals; its micros are still considered for rate. Stale micros
/// only drop out of the rate and device count, never out of the keyspace.
///
/// Speed count is summed across all tasks. Speed duration is summed too, but
/// after a task whose last micro is fresh the running duration is divided by
/// that task's micro count; hash rate output depends on this per-task
/// averaging. A task whose last micro is stale leaves the duration alone.
pub fn reduce_tasks(tasks: &[Task], now: i64, window: Duration) -> ProgressTotals {
    let mut totals = ProgressTotals::default();
    let mut speed_count = KeyspaceValue::zero();
    let mut speed_duration_ms = KeyspaceValue::zero();

    tracing::debug!("task length: {}", tasks.len());

    for task in tasks {
        match scale_task(task) {
            Ok(scaled) => {
                totals.total_keyspace += &scaled.total;
                totals.completed_keyspace += &scaled.completed;
                totals.in_progress_keyspace += &scaled.in_progress;
            }
            Err(e) => {
                tracing::debug!(task_id = task.id, "skipping task keyspace: {}", e);
            }
        }

        tracing::debug!(task_id = task.id, "micro length {}", task.micros.len());
        let mut last_fresh = false;
        for micro in &task.micros {
            last_fresh = is_fresh(micro, now, window);
            if !last_fresh {
                tracing::debug!(micro_id = micro.id, "micro is stale");
                continue;
            }
            totals.active_devices += 1;
            speed_count += &KeyspaceValue::from(micro.status.speed_count);
            speed_duration_ms += &KeyspaceValue::from(micro.status.speed_duration_ms);
        }

        // Averaging happens when the task's last micro is fresh; the divisor
        // is the task's full micro count.
        if last_fresh && !speed_duration_ms.is_zero() {
            let visited = KeyspaceValue::from(task.micros.len() as u64);
            if let Some(avg) = speed_duration_ms.checked_div(&visited) {
                speed_duration_ms = avg;
            }
        }
    }

    totals.speed_per_sec = speed_count
        .scaled_by(&KeyspaceValue::from(1000))
        .checked_div(&speed_duration_ms)
        .unwrap_or_default();

    tracing::debug!(
        "speed /s: {} keyspace: {} completed: {}",
        totals.speed_per_sec,
        totals.total_keyspace,
        totals.completed_keyspace
    );

    totals
}
