//! One tick's worth of coordinator data.

use crate::fetch::{FetchError, SnapshotFetcher};
use crate::model::{AgentEvent, HashList, Job, Task};

/// Job, tasks and events fetched together for one refresh.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub job: Job,
    pub tasks: Vec<Task>,
    pub events: Vec<AgentEvent>,
    /// Missing when the list lookup failed; only decorates the report.
    pub list: Option<HashList>,
}

impl Snapshot {
    /// Blocking. Any failure of job, tasks or events fails the whole
    /// snapshot; a failed list lookup does not.
    pub fn fetch<F>(fetcher: &F, project_id: i64, job_id: i64) -> Result<Self, FetchError>
    where
        F: SnapshotFetcher + ?Sized,
    {
        let job = fetcher.get_job(project_id, job_id)?;
        let tasks = fetcher.get_tasks(project_id, job_id)?;
        let events = fetcher.get_events(project_id, job_id)?;
        let list = match fetcher.get_list(job.project_id, job.list_id) {
            Ok(l) => Some(l),
            Err(e) => {
                tracing::debug!(list_id = job.list_id, "list lookup failed: {}", e);
                None
            }
        };
        Ok(Self {
            job,
            tasks,
            events,
            list,
        })
    }
}
