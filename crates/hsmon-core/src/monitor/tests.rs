//! Monitor loop tests driven by a scripted in-memory coordinator.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::fetch::{FetchError, JobRemover, SnapshotFetcher};
use crate::keyspace::KeyspaceValue;
use crate::model::{AgentEvent, HashList, Job, Task};
use crate::progress::ProgressReport;

use super::{signal_channel, JobMonitor, MonitorOptions, MonitorSignal, MonitorState};

/// Serves scripted job states in order; the last one repeats.
struct ScriptedFetcher {
    jobs: Mutex<VecDeque<Job>>,
    /// Tick numbers (1-based) whose task fetch fails.
    failing_ticks: Vec<usize>,
    job_calls: AtomicUsize,
    task_calls: AtomicUsize,
    fetch_delay: Duration,
    removed: AtomicBool,
}

impl ScriptedFetcher {
    fn new(jobs: Vec<Job>) -> Self {
        Self {
            jobs: Mutex::new(jobs.into()),
            failing_ticks: Vec::new(),
            job_calls: AtomicUsize::new(0),
            task_calls: AtomicUsize::new(0),
            fetch_delay: Duration::ZERO,
            removed: AtomicBool::new(false),
        }
    }
}

impl SnapshotFetcher for ScriptedFetcher {
    fn get_job(&self, _project_id: i64, _job_id: i64) -> Result<Job, FetchError> {
        self.job_calls.fetch_add(1, Ordering::SeqCst);
        if !self.fetch_delay.is_zero() {
            std::thread::sleep(self.fetch_delay);
        }
        let mut jobs = self.jobs.lock().unwrap();
        if jobs.len() > 1 {
            Ok(jobs.pop_front().unwrap())
        } else {
            Ok(jobs.front().cloned().unwrap())
        }
    }

    fn get_tasks(&self, _project_id: i64, _job_id: i64) -> Result<Vec<Task>, FetchError> {
        let n = self.task_calls.fetch_add(1, Ordering::SeqCst) + 1;
        if self.failing_ticks.contains(&n) {
            return Err(FetchError::Server(502));
        }
        Ok(vec![Task {
            keyspace: "1000".into(),
            keyspace_completed: "500".into(),
            keyspace_in_progress: "0".into(),
            modifier: "1".into(),
            ..Task::default()
        }])
    }

    fn get_events(&self, _project_id: i64, _job_id: i64) -> Result<Vec<AgentEvent>, FetchError> {
        Ok(Vec::new())
    }

    fn get_list(&self, _project_id: i64, _list_id: i64) -> Result<HashList, FetchError> {
        Err(FetchError::NotFound)
    }
}

impl JobRemover for ScriptedFetcher {
    fn remove_job(&self, _job: &Job) -> Result<(), FetchError> {
        self.removed.store(true, Ordering::SeqCst);
        Ok(())
    }
}

fn job(exhausted: bool) -> Job {
    Job {
        id: 7,
        project_id: 1,
        is_active: true,
        is_exhausted: exhausted,
        ..Job::default()
    }
}

fn fast_opts(remote_abort: bool) -> MonitorOptions {
    MonitorOptions {
        poll_interval: Duration::from_millis(10),
        remote_abort,
        ..MonitorOptions::default()
    }
}

#[tokio::test]
async fn finishes_when_job_becomes_exhausted() {
    let fetcher = Arc::new(ScriptedFetcher::new(vec![job(false), job(true)]));
    let monitor = JobMonitor::new(Arc::clone(&fetcher), job(false), fast_opts(false));
    let (_tx, rx) = signal_channel();

    let mut rendered: Vec<ProgressReport> = Vec::new();
    let mut sink = |r: &ProgressReport| rendered.push(r.clone());
    let outcome = monitor.run(rx, &mut sink).await;

    assert_eq!(outcome.state, MonitorState::Finished);
    assert!(!outcome.job_removed);
    assert_eq!(rendered.len(), 2);
    assert!(rendered[1].job.is_exhausted);
    assert_eq!(outcome.last_report.unwrap().completed_keyspace, KeyspaceValue::from(500));

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(fetcher.job_calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn failed_refresh_skips_render_and_keeps_polling() {
    let mut f = ScriptedFetcher::new(vec![job(false), job(false), job(true)]);
    f.failing_ticks = vec![1];
    let fetcher = Arc::new(f);
    let monitor = JobMonitor::new(Arc::clone(&fetcher), job(false), fast_opts(false));
    let (_tx, rx) = signal_channel();

    let mut renders = 0usize;
    let mut sink = |_: &ProgressReport| renders += 1;
    let outcome = monitor.run(rx, &mut sink).await;

    assert_eq!(outcome.state, MonitorState::Finished);
    assert_eq!(fetcher.task_calls.load(Ordering::SeqCst), 3);
    assert_eq!(renders, 2);
}

#[tokio::test]
async fn detach_leaves_job_running() {
    let fetcher = Arc::new(ScriptedFetcher::new(vec![job(false)]));
    let monitor = JobMonitor::new(Arc::clone(&fetcher), job(false), fast_opts(true));
    let (tx, rx) = signal_channel();

    let mut renders = 0usize;
    let mut sink = |_: &ProgressReport| {
        renders += 1;
        if renders == 2 {
            let _ = tx.send(Some(MonitorSignal::Detach));
        }
    };
    let outcome = monitor.run(rx, &mut sink).await;

    assert_eq!(outcome.state, MonitorState::Cancelled);
    assert!(!outcome.job_removed);
    assert!(!fetcher.removed.load(Ordering::SeqCst));
    assert!(outcome.last_report.is_some());
}

#[tokio::test]
async fn abort_removes_job_when_enabled() {
    let fetcher = Arc::new(ScriptedFetcher::new(vec![job(false)]));
    let monitor = JobMonitor::new(Arc::clone(&fetcher), job(false), fast_opts(true));
    let (tx, rx) = signal_channel();
    tx.send(Some(MonitorSignal::Abort)).unwrap();

    let mut sink = |_: &ProgressReport| {};
    let outcome = monitor.run(rx, &mut sink).await;

    assert_eq!(outcome.state, MonitorState::Cancelled);
    assert!(outcome.job_removed);
    assert!(fetcher.removed.load(Ordering::SeqCst));
}

#[tokio::test]
async fn abort_without_capability_only_detaches() {
    let fetcher = Arc::new(ScriptedFetcher::new(vec![job(false)]));
    let monitor = JobMonitor::new(Arc::clone(&fetcher), job(false), fast_opts(false));
    let (tx, rx) = signal_channel();
    tx.send(Some(MonitorSignal::Abort)).unwrap();

    let mut sink = |_: &ProgressReport| {};
    let outcome = monitor.run(rx, &mut sink).await;

    assert_eq!(outcome.state, MonitorState::Cancelled);
    assert!(!outcome.job_removed);
    assert!(!fetcher.removed.load(Ordering::SeqCst));
}

#[tokio::test]
async fn signal_during_fetch_waits_for_tick_boundary() {
    let mut f = ScriptedFetcher::new(vec![job(false)]);
    f.fetch_delay = Duration::from_millis(100);
    let fetcher = Arc::new(f);
    let monitor = JobMonitor::new(Arc::clone(&fetcher), job(false), fast_opts(false));
    let (tx, rx) = signal_channel();

    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(30)).await;
        let _ = tx.send(Some(MonitorSignal::Detach));
        // Keep the sender alive until the monitor has seen the signal.
        tokio::time::sleep(Duration::from_millis(500)).await;
    });

    let mut renders = 0usize;
    let mut sink = |_: &ProgressReport| renders += 1;
    let outcome = monitor.run(rx, &mut sink).await;

    assert_eq!(outcome.state, MonitorState::Cancelled);
    assert_eq!(renders, 1, "in-flight refresh should complete and render");
    assert_eq!(fetcher.job_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn dropped_signal_sender_does_not_stop_polling() {
    let fetcher = Arc::new(ScriptedFetcher::new(vec![job(false), job(false), job(true)]));
    let monitor = JobMonitor::new(Arc::clone(&fetcher), job(false), fast_opts(false));
    let (tx, rx) = signal_channel();
    drop(tx);

    let mut renders = 0usize;
    let mut sink = |_: &ProgressReport| renders += 1;
    let outcome = monitor.run(rx, &mut sink).await;

    assert_eq!(outcome.state, MonitorState::Finished);
    assert_eq!(renders, 3);
}

#[tokio::test]
async fn single_tick_reports_current_progress() {
    let fetcher = Arc::new(ScriptedFetcher::new(vec![job(false)]));
    let mut monitor = JobMonitor::new(fetcher, job(false), fast_opts(false));
    assert_eq!(monitor.state(), MonitorState::Polling);
    let report = monitor.tick().await.expect("report");
    assert_eq!(report.total_keyspace, KeyspaceValue::from(1000));
    assert!((report.percent_complete - 50.0).abs() < 1e-9);
    assert!(report.cracked.is_none());
}
