//! Coordinator snapshot types (job, tasks, micros, agent events, hash lists).
//!
//! Only the fields the aggregator and renderer consume are modelled. Every
//! field is defaulted so a partially populated response still decodes.

use serde::{Deserialize, Deserializer, Serialize};

/// A unit of cluster work: one hash list attacked with one attack plan.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Job {
    pub id: i64,
    pub project_id: i64,
    pub list_id: i64,
    pub attack_id: i64,
    pub name: String,
    pub priority: i64,
    /// Device cap across the cluster (0 = unlimited).
    pub max_dedicated_devices: i64,
    pub is_active: bool,
    pub is_exhausted: bool,
    /// Unix seconds.
    pub created_at: i64,
    /// Unix seconds when the first task started; 0 if none has.
    pub first_task_time: i64,
    /// Unix seconds of the most recent task; 0 if unknown.
    pub last_task_time: i64,
}

/// Running / paused / finished, derived from the job's two flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobStatus {
    Running,
    Paused,
    Finished,
}

impl Job {
    /// Exhausted means finished regardless of the active flag.
    pub fn status(&self) -> JobStatus {
        if self.is_exhausted {
            JobStatus::Finished
        } else if !self.is_active {
            JobStatus::Paused
        } else {
            JobStatus::Running
        }
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            JobStatus::Running => "Running",
            JobStatus::Paused => "Paused",
            JobStatus::Finished => "Finished",
        };
        f.write_str(s)
    }
}

/// One partition of a job's keyspace.
///
/// Keyspace fields are raw decimal strings; they only mean something after
/// parsing and multiplying by `modifier`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Task {
    pub id: i64,
    #[serde(deserialize_with = "string_or_number")]
    pub keyspace: String,
    #[serde(deserialize_with = "string_or_number")]
    pub keyspace_completed: String,
    #[serde(deserialize_with = "string_or_number")]
    pub keyspace_in_progress: String,
    #[serde(deserialize_with = "string_or_number")]
    pub modifier: String,
    #[serde(deserialize_with = "null_as_empty")]
    pub micros: Vec<Micro>,
}

/// One device's execution unit within a task.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Micro {
    pub id: i64,
    pub task_id: i64,
    pub status: MicroStatus,
}

/// Last status report from a device.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MicroStatus {
    /// Work units completed since the previous report.
    #[serde(rename = "speed_cnt")]
    pub speed_count: u64,
    /// Duration the speed count was sampled over, in milliseconds.
    #[serde(rename = "speed_ms")]
    pub speed_duration_ms: u64,
    /// Unix seconds.
    pub updated_at: i64,
    pub progress: u64,
}

/// Error/diagnostic record emitted by an agent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentEvent {
    pub id: i64,
    pub agent_id: String,
    /// Unix seconds.
    pub created_at: i64,
    pub updated_at: i64,
    pub buffer: String,
}

/// Target hash list of a job.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HashList {
    pub id: i64,
    pub project_id: i64,
    pub name: String,
    pub hash_mode: i64,
    pub digest_count: i64,
    pub recovered_count: i64,
}

/// Attack plan attached to a job; only the title is needed to recognise plans
/// created for a single job.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AttackPlan {
    pub id: i64,
    pub title: String,
}

/// Title the hashstack CLI gives attack plans it creates for a single job.
pub fn synthetic_attack_title(job: &Job) -> String {
    format!("hashstack-cli-{}-{}-{}", job.project_id, job.list_id, job.name)
}

/// Accept `"123"`, `123` or `null` for keyspace-like fields.
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Str(String),
        Unsigned(u64),
        Signed(i64),
        Float(f64),
    }

    Ok(match Option::<Raw>::deserialize(deserializer)? {
        None => String::new(),
        Some(Raw::Str(s)) => s,
        Some(Raw::Unsigned(n)) => n.to_string(),
        // Kept verbatim so the keyspace parser rejects it as malformed.
        Some(Raw::Signed(n)) => n.to_string(),
        Some(Raw::Float(f)) => f.to_string(),
    })
}

fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}
