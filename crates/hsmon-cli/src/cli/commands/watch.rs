//! `hsmon watch <project> <job>` – attach and refresh until finished or detached.

use anyhow::{Context, Result};
use hsmon_core::config::MonitorConfig;
use hsmon_core::fetch::{HttpClient, SnapshotFetcher};
use hsmon_core::monitor::{signal_channel, JobMonitor, MonitorOptions, MonitorState};
use hsmon_core::progress::{unix_now, ProgressReport};
use hsmon_core::render::render_report;
use std::sync::Arc;
use std::time::Duration;

use crate::cli::signals;

pub async fn run_watch(
    client: HttpClient,
    cfg: &MonitorConfig,
    project_id: i64,
    job_id: i64,
    delete_on_quit: bool,
    interval: Option<u64>,
) -> Result<()> {
    let client = Arc::new(client);

    // A job that cannot be loaded before attaching is fatal; later refresh
    // failures only skip a tick.
    let job = {
        let client = Arc::clone(&client);
        tokio::task::spawn_blocking(move || client.get_job(project_id, job_id))
            .await?
            .with_context(|| format!("could not load job {} in project {}", job_id, project_id))?
    };

    let mut opts = MonitorOptions::from_config(cfg);
    if let Some(secs) = interval {
        opts.poll_interval = Duration::from_secs(secs);
    }
    opts.remote_abort = delete_on_quit;

    let footer = if delete_on_quit {
        "Ctrl-C to exit, the job will continue to run. Ctrl-\\ to exit and delete the job."
    } else {
        "Ctrl-C to exit, the job will continue to run."
    };

    let (tx, rx) = signal_channel();
    let listener = signals::spawn_signal_listener(tx);
    let monitor = JobMonitor::new(client, job, opts);

    let mut sink = |report: &ProgressReport| {
        print!("{}", render_report(report, unix_now()));
        println!("\n{}\n", footer);
    };
    let outcome = monitor.run(rx, &mut sink).await;
    listener.abort();

    match outcome.state {
        MonitorState::Finished => println!("Job {} has finished.", job_id),
        MonitorState::Cancelled if outcome.job_removed => {
            println!("Job {} was removed from the server.", job_id)
        }
        MonitorState::Cancelled => {
            println!("Detached; job {} continues to run on the server.", job_id)
        }
        MonitorState::Polling => {}
    }
    Ok(())
}
