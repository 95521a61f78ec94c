//! Per-tick aggregate report and the small state objects carried across ticks.

use std::time::Duration;

use crate::keyspace::{ratio_percent, KeyspaceValue};
use crate::model::{AgentEvent, HashList, Job, JobStatus, Task};

use super::eta::{estimate_eta, Eta};
use super::reducer::reduce_tasks;

/// Everything the renderer needs for one refresh of a job.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressReport {
    pub job: Job,
    pub status: JobStatus,
    pub completed_keyspace: KeyspaceValue,
    pub total_keyspace: KeyspaceValue,
    pub in_progress_keyspace: KeyspaceValue,
    pub percent_complete: f64,
    pub active_devices: usize,
    pub speed_per_sec: KeyspaceValue,
    pub eta: Eta,
    /// Agent errors reported since the previous tick.
    pub new_error_count: usize,
    pub new_error_messages: Vec<String>,
    /// All agent errors recorded for the job.
    pub total_errors: usize,
    pub cracked: Option<CrackedStats>,
}

/// Recovery stats of the job's target hash list.
#[derive(Debug, Clone, PartialEq)]
pub struct CrackedStats {
    pub list_name: String,
    pub hash_mode: i64,
    pub recovered: i64,
    pub digests: i64,
    pub percent: f64,
    /// Plains recovered since the previous tick.
    pub newly_recovered: i64,
}

/// Last-seen timestamp for agent errors. Events created at or after the
/// watermark are new; surfacing any of them moves the watermark to "now".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ErrorWatermark {
    since: i64,
}

impl ErrorWatermark {
    pub fn new(since: i64) -> Self {
        Self { since }
    }

    pub fn since(&self) -> i64 {
        self.since
    }

    /// Return the events that are new relative to the watermark.
    pub fn observe<'a>(&mut self, events: &'a [AgentEvent], now: i64) -> Vec<&'a AgentEvent> {
        let fresh: Vec<&AgentEvent> = events
            .iter()
            .filter(|e| e.created_at >= self.since)
            .collect();
        if !fresh.is_empty() {
            self.since = now;
        }
        fresh
    }
}

/// Remembers the list's recovered count so newly cracked plains can be
/// announced once.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CrackedTracker {
    seen: i64,
}

impl CrackedTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns how many plains were recovered since the last call. The first
    /// non-zero count only sets the baseline.
    pub fn observe(&mut self, recovered: i64) -> i64 {
        if self.seen == 0 && recovered != 0 {
            self.seen = recovered;
            return 0;
        }
        if recovered > self.seen {
            let newly = recovered - self.seen;
            self.seen = recovered;
            return newly;
        }
        0
    }
}

/// Reduce one snapshot into a report. `events` drive the error watermark;
/// `list` is optional because list stats are decoration, not progress.
#[allow(clippy::too_many_arguments)]
pub fn build_report(
    job: &Job,
    tasks: &[Task],
    events: &[AgentEvent],
    list: Option<&HashList>,
    watermark: &mut ErrorWatermark,
    cracked: &mut CrackedTracker,
    now: i64,
    window: Duration,
) -> ProgressReport {
    let totals = reduce_tasks(tasks, now, window);
    let eta = estimate_eta(&totals.total_keyspace, &totals.speed_per_sec, job.first_task_time, now);
    let percent_complete = ratio_percent(&totals.completed_keyspace, &totals.total_keyspace);

    let new_errors = watermark.observe(events, now);
    let new_error_messages: Vec<String> = new_errors.iter().map(|e| e.buffer.clone()).collect();

    let cracked = list.map(|l| CrackedStats {
        list_name: l.name.clone(),
        hash_mode: l.hash_mode,
        recovered: l.recovered_count,
        digests: l.digest_count,
        percent: if l.digest_count > 0 {
            l.recovered_count as f64 / l.digest_count as f64 * 100.0
        } else {
            0.0
        },
        newly_recovered: cracked.observe(l.recovered_count),
    });

    ProgressReport {
        job: job.clone(),
        status: job.status(),
        completed_keyspace: totals.completed_keyspace,
        total_keyspace: totals.total_keyspace,
        in_progress_keyspace: totals.in_progress_keyspace,
        percent_complete,
        active_devices: totals.active_devices,
        speed_per_sec: totals.speed_per_sec,
        eta,
        new_error_count: new_error_messages.len(),
        new_error_messages,
        total_errors: events.len(),
        cracked,
    }
}
