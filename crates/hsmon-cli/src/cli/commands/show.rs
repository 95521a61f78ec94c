//! `hsmon show <project> <job>` – one refresh, printed once.

use anyhow::{Context, Result};
use hsmon_core::config::MonitorConfig;
use hsmon_core::fetch::HttpClient;
use hsmon_core::monitor::Snapshot;
use hsmon_core::progress::{build_report, unix_now, CrackedTracker, ErrorWatermark};
use hsmon_core::render::render_report;

pub async fn run_show(
    client: HttpClient,
    cfg: &MonitorConfig,
    project_id: i64,
    job_id: i64,
) -> Result<()> {
    let snapshot = tokio::task::spawn_blocking(move || Snapshot::fetch(&client, project_id, job_id))
        .await?
        .with_context(|| format!("could not load job {} in project {}", job_id, project_id))?;

    let now = unix_now();
    // One-shot: no earlier tick to compare errors or cracked counts against.
    let mut watermark = ErrorWatermark::new(now);
    let mut cracked = CrackedTracker::new();
    let report = build_report(
        &snapshot.job,
        &snapshot.tasks,
        &snapshot.events,
        snapshot.list.as_ref(),
        &mut watermark,
        &mut cracked,
        now,
        cfg.staleness_window(),
    );
    print!("{}", render_report(&report, now));
    Ok(())
}
