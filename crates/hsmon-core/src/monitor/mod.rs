//! Live monitor: periodic fetch → reduce → render for one attached job.
//!
//! States: `Polling` until the job reports exhausted (`Finished`) or an
//! operator signal arrives (`Cancelled`). Signals are only observed between
//! ticks; an in-flight fetch always completes and renders first.

mod snapshot;

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::MissedTickBehavior;

use crate::config::MonitorConfig;
use crate::fetch::{JobRemover, SnapshotFetcher};
use crate::model::Job;
use crate::progress::{
    build_report, unix_now, CrackedTracker, ErrorWatermark, ProgressReport,
    DEFAULT_STALENESS_WINDOW,
};

pub use snapshot::Snapshot;

/// Operator request delivered to a running monitor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorSignal {
    /// Stop watching; the job keeps running on the coordinator.
    Detach,
    /// Stop watching and delete the job on the coordinator. Only honoured
    /// when [`MonitorOptions::remote_abort`] is enabled; otherwise it is a
    /// plain detach.
    Abort,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorState {
    Polling,
    Cancelled,
    Finished,
}

pub type SignalSender = watch::Sender<Option<MonitorSignal>>;
pub type SignalReceiver = watch::Receiver<Option<MonitorSignal>>;

/// Channel carrying at most one meaningful signal from the listener to the loop.
pub fn signal_channel() -> (SignalSender, SignalReceiver) {
    watch::channel(None)
}

#[derive(Debug, Clone, Copy)]
pub struct MonitorOptions {
    pub poll_interval: Duration,
    pub staleness_window: Duration,
    /// Enables the destructive `Abort` signal (remote job removal).
    pub remote_abort: bool,
}

impl Default for MonitorOptions {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(5),
            staleness_window: DEFAULT_STALENESS_WINDOW,
            remote_abort: false,
        }
    }
}

impl MonitorOptions {
    pub fn from_config(cfg: &MonitorConfig) -> Self {
        Self {
            poll_interval: cfg.poll_interval(),
            staleness_window: cfg.staleness_window(),
            remote_abort: false,
        }
    }
}

/// Receives each successfully built report.
pub trait ReportSink {
    fn render(&mut self, report: &ProgressReport);
}

impl<T: FnMut(&ProgressReport)> ReportSink for T {
    fn render(&mut self, report: &ProgressReport) {
        self(report)
    }
}

/// How the loop ended.
#[derive(Debug, Clone)]
pub struct MonitorOutcome {
    pub state: MonitorState,
    pub last_report: Option<ProgressReport>,
    /// True only when an abort removed the job server-side.
    pub job_removed: bool,
}

/// Monitor for one job. Carries the error watermark and cracked tracker
/// across ticks so report building itself stays pure.
pub struct JobMonitor<F> {
    fetcher: Arc<F>,
    job: Job,
    opts: MonitorOptions,
    watermark: ErrorWatermark,
    cracked: CrackedTracker,
    state: MonitorState,
    last_report: Option<ProgressReport>,
}

impl<F> JobMonitor<F>
where
    F: SnapshotFetcher + 'static,
{
    /// `job` is the already-validated job; errors older than now are not
    /// surfaced.
    pub fn new(fetcher: Arc<F>, job: Job, opts: MonitorOptions) -> Self {
        Self {
            fetcher,
            job,
            opts,
            watermark: ErrorWatermark::new(unix_now()),
            cracked: CrackedTracker::new(),
            state: MonitorState::Polling,
            last_report: None,
        }
    }

    pub fn state(&self) -> MonitorState {
        self.state
    }

    pub fn job(&self) -> &Job {
        &self.job
    }

    /// One fetch + reduce pass. `None` when the refresh failed; the caller
    /// simply waits for the next tick.
    pub async fn tick(&mut self) -> Option<ProgressReport> {
        let fetcher = Arc::clone(&self.fetcher);
        let (project_id, job_id) = (self.job.project_id, self.job.id);
        let snapshot = match tokio::task::spawn_blocking(move || {
            Snapshot::fetch(fetcher.as_ref(), project_id, job_id)
        })
        .await
        {
            Ok(Ok(s)) => s,
            Ok(Err(e)) => {
                tracing::warn!(job_id, "refresh failed, waiting for next tick: {}", e);
                return None;
            }
            Err(e) => {
                tracing::warn!(job_id, "refresh task failed: {}", e);
                return None;
            }
        };

        let now = unix_now();
        let report = build_report(
            &snapshot.job,
            &snapshot.tasks,
            &snapshot.events,
            snapshot.list.as_ref(),
            &mut self.watermark,
            &mut self.cracked,
            now,
            self.opts.staleness_window,
        );
        self.job = snapshot.job;
        Some(report)
    }
}

impl<F> JobMonitor<F>
where
    F: SnapshotFetcher + JobRemover + 'static,
{
    /// Poll until the job is exhausted or a signal arrives. The first tick
    /// fires immediately.
    pub async fn run<S: ReportSink>(
        mut self,
        mut signals: SignalReceiver,
        sink: &mut S,
    ) -> MonitorOutcome {
        let mut interval = tokio::time::interval(self.opts.poll_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut signals_open = true;

        tracing::info!(
            job_id = self.job.id,
            project_id = self.job.project_id,
            "monitor attached (interval {:?})",
            self.opts.poll_interval
        );

        loop {
            tokio::select! {
                biased;
                changed = signals.changed(), if signals_open => {
                    match changed {
                        Ok(()) => {
                            let signal = *signals.borrow_and_update();
                            if let Some(signal) = signal {
                                return self.cancel(signal).await;
                            }
                        }
                        // Listener gone; keep polling without signals.
                        Err(_) => signals_open = false,
                    }
                    continue;
                }
                _ = interval.tick() => {}
            }

            let Some(report) = self.tick().await else {
                continue;
            };
            sink.render(&report);
            let exhausted = report.job.is_exhausted;
            self.last_report = Some(report);
            if exhausted {
                self.state = MonitorState::Finished;
                tracing::info!(job_id = self.job.id, "job finished, monitor exiting");
                return MonitorOutcome {
                    state: self.state,
                    last_report: self.last_report,
                    job_removed: false,
                };
            }
        }
    }

    async fn cancel(mut self, signal: MonitorSignal) -> MonitorOutcome {
        self.state = MonitorState::Cancelled;
        let mut job_removed = false;

        match signal {
            MonitorSignal::Detach => {
                tracing::info!(job_id = self.job.id, "monitor detached, job keeps running");
            }
            MonitorSignal::Abort if !self.opts.remote_abort => {
                tracing::warn!(
                    job_id = self.job.id,
                    "abort requested but remote abort is disabled; detaching only"
                );
            }
            MonitorSignal::Abort => {
                let fetcher = Arc::clone(&self.fetcher);
                let job = self.job.clone();
                match tokio::task::spawn_blocking(move || fetcher.remove_job(&job)).await {
                    Ok(Ok(())) => job_removed = true,
                    Ok(Err(e)) => tracing::warn!(job_id = self.job.id, "job removal failed: {}", e),
                    Err(e) => tracing::warn!(job_id = self.job.id, "job removal task failed: {}", e),
                }
            }
        }

        MonitorOutcome {
            state: self.state,
            last_report: self.last_report,
            job_removed,
        }
    }
}

#[cfg(test)]
mod tests;
