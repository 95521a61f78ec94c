//! Blocking JSON client for the coordinator REST API (libcurl).

use serde::de::DeserializeOwned;
use std::time::Duration;
use url::Url;

use super::error::{error_for_status, FetchError};
use super::{JobRemover, SnapshotFetcher};
use crate::config::MonitorConfig;
use crate::model::{synthetic_attack_title, AgentEvent, AttackPlan, HashList, Job, Task};
use crate::retry::{run_with_retry, RetryPolicy};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Method {
    Get,
    Delete,
}

/// Authenticated client for one coordinator.
#[derive(Debug, Clone)]
pub struct HttpClient {
    base: String,
    token: String,
    connect_timeout: Duration,
    timeout: Duration,
    retry: RetryPolicy,
}

impl HttpClient {
    /// Validates `server_url` (http/https with a host) up front so a bad URL
    /// is a setup error rather than a per-tick failure.
    pub fn new(server_url: &str, token: &str, cfg: &MonitorConfig) -> Result<Self, FetchError> {
        let invalid = |reason: &str| FetchError::InvalidUrl {
            url: server_url.to_string(),
            reason: reason.to_string(),
        };
        let parsed = Url::parse(server_url).map_err(|e| invalid(&e.to_string()))?;
        if parsed.scheme() != "http" && parsed.scheme() != "https" {
            return Err(invalid("scheme must be http or https"));
        }
        if parsed.host_str().is_none() {
            return Err(invalid("missing host"));
        }
        Ok(Self {
            base: parsed.as_str().trim_end_matches('/').to_string(),
            token: token.to_string(),
            connect_timeout: Duration::from_secs(cfg.connect_timeout_secs),
            timeout: Duration::from_secs(cfg.request_timeout_secs),
            retry: RetryPolicy::from_config(&cfg.retry_config()),
        })
    }

    fn url_for(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    fn request(&self, method: Method, path: &str) -> Result<Vec<u8>, FetchError> {
        let url = self.url_for(path);
        let mut body = Vec::new();

        let mut easy = curl::easy::Easy::new();
        easy.url(&url)?;
        easy.follow_location(true)?;
        easy.connect_timeout(self.connect_timeout)?;
        easy.timeout(self.timeout)?;
        if method == Method::Delete {
            easy.custom_request("DELETE")?;
        }

        let mut list = curl::easy::List::new();
        list.append("Accept: application/json")?;
        list.append(&format!("Authorization: bearer {}", self.token))?;
        easy.http_headers(list)?;

        {
            let mut transfer = easy.transfer();
            transfer.write_function(|data| {
                body.extend_from_slice(data);
                Ok(data.len())
            })?;
            transfer.perform()?;
        }

        let code = easy.response_code()?;
        tracing::debug!(?method, %url, code, bytes = body.len(), "coordinator response");
        if let Some(err) = error_for_status(code) {
            return Err(err);
        }
        Ok(body)
    }

    fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, FetchError> {
        let body = self.request(Method::Get, path)?;
        serde_json::from_slice(&body).map_err(|e| {
            tracing::debug!("undecodable body from {}: {}", path, String::from_utf8_lossy(&body));
            FetchError::Decode(e)
        })
    }

    /// Lists may come back as `null` or an empty body when there is nothing.
    fn get_json_list<T: DeserializeOwned>(&self, path: &str) -> Result<Vec<T>, FetchError> {
        let body = self.request(Method::Get, path)?;
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Vec::new());
        }
        let items: Option<Vec<T>> = serde_json::from_slice(&body)?;
        Ok(items.unwrap_or_default())
    }

    fn delete(&self, path: &str) -> Result<(), FetchError> {
        self.request(Method::Delete, path).map(|_| ())
    }
}

impl SnapshotFetcher for HttpClient {
    fn get_job(&self, project_id: i64, job_id: i64) -> Result<Job, FetchError> {
        self.get_json(&format!("/api/projects/{}/jobs/{}", project_id, job_id))
    }

    fn get_tasks(&self, project_id: i64, job_id: i64) -> Result<Vec<Task>, FetchError> {
        let path = format!("/api/projects/{}/jobs/{}/tasks", project_id, job_id);
        run_with_retry(&self.retry, || self.get_json_list(&path))
    }

    fn get_events(&self, project_id: i64, job_id: i64) -> Result<Vec<AgentEvent>, FetchError> {
        self.get_json_list(&format!("/api/projects/{}/jobs/{}/events", project_id, job_id))
    }

    fn get_list(&self, project_id: i64, list_id: i64) -> Result<HashList, FetchError> {
        self.get_json(&format!("/api/projects/{}/lists/{}", project_id, list_id))
    }
}

impl JobRemover for HttpClient {
    fn remove_job(&self, job: &Job) -> Result<(), FetchError> {
        let attack: Option<AttackPlan> = match self.get_json(&format!("/api/attacks/{}", job.attack_id)) {
            Ok(a) => Some(a),
            Err(e) => {
                tracing::warn!(attack_id = job.attack_id, "could not load attack plan: {}", e);
                None
            }
        };
        self.delete(&format!("/api/projects/{}/jobs/{}", job.project_id, job.id))?;
        tracing::info!(job_id = job.id, project_id = job.project_id, "job removed from server");

        if let Some(attack) = attack {
            if attack.title == synthetic_attack_title(job) {
                if let Err(e) = self.delete(&format!("/api/attacks/{}", job.attack_id)) {
                    tracing::warn!(attack_id = job.attack_id, "could not remove attack plan: {}", e);
                }
            }
        }
        Ok(())
    }
}
