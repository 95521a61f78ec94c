//! Snapshot fetching from the coordinator.
//!
//! The monitor only depends on the [`SnapshotFetcher`] and [`JobRemover`]
//! traits; [`HttpClient`] is the libcurl-backed implementation used by the
//! CLI. Implementations are blocking; call them from `spawn_blocking`.

mod error;
mod http;

pub use error::{error_for_status, FetchError};
pub use http::HttpClient;

use crate::model::{AgentEvent, HashList, Job, Task};

/// Read access to a job's current best-effort snapshot.
pub trait SnapshotFetcher: Send + Sync {
    fn get_job(&self, project_id: i64, job_id: i64) -> Result<Job, FetchError>;

    /// May retry transient failures internally before returning an error.
    fn get_tasks(&self, project_id: i64, job_id: i64) -> Result<Vec<Task>, FetchError>;

    fn get_events(&self, project_id: i64, job_id: i64) -> Result<Vec<AgentEvent>, FetchError>;

    fn get_list(&self, project_id: i64, list_id: i64) -> Result<HashList, FetchError>;
}

/// Destructive removal of a job on the coordinator.
pub trait JobRemover: Send + Sync {
    /// Delete the job, and its attack plan if the plan was created for this
    /// job alone.
    fn remove_job(&self, job: &Job) -> Result<(), FetchError>;
}
