//! Remaining-time estimate from aggregate throughput.

use std::time::Duration;

use crate::keyspace::KeyspaceValue;

/// Estimated time to exhaust the job's keyspace.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Eta {
    /// No rate or no keyspace to project from. Distinct from a zero duration,
    /// which means completion is imminent.
    Undetermined,
    Remaining(Duration),
}

/// Project remaining time as `total / speed`, corrected for time already
/// spent since `first_task_time`.
///
/// When the projection is smaller than the elapsed time the uncorrected
/// projection is returned instead of going negative. `first_task_time` of 0
/// means the job has not started and no correction applies.
pub fn estimate_eta(
    total_keyspace: &KeyspaceValue,
    speed_per_sec: &KeyspaceValue,
    first_task_time: i64,
    now: i64,
) -> Eta {
    if total_keyspace.is_zero() {
        return Eta::Undetermined;
    }
    let remaining = match total_keyspace.checked_div(speed_per_sec) {
        Some(secs) => secs.to_u64_saturating(),
        None => return Eta::Undetermined,
    };

    let elapsed = if first_task_time == 0 {
        0
    } else {
        now.saturating_sub(first_task_time).max(0) as u64
    };

    let secs = if remaining > elapsed {
        remaining - elapsed
    } else {
        remaining
    };
    tracing::debug!("eta seconds: {} (elapsed {})", secs, elapsed);
    Eta::Remaining(Duration::from_secs(secs))
}
