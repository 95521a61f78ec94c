//! CLI for the hsmon job monitor.

mod commands;
mod signals;

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use hsmon_core::config::{self, MonitorConfig};
use hsmon_core::fetch::HttpClient;

use commands::{run_completions, run_show, run_watch};

/// Top-level CLI for the hsmon job monitor.
#[derive(Debug, Parser)]
#[command(name = "hsmon")]
#[command(about = "hsmon: live progress monitor for Hashstack cracking jobs", long_about = None)]
pub struct Cli {
    /// Coordinator base URL. Overrides `server_url` from config.toml.
    #[arg(long, global = true, value_name = "URL")]
    pub server: Option<String>,

    /// API token. Overrides `token` from config.toml.
    #[arg(long, global = true, value_name = "TOKEN")]
    pub token: Option<String>,

    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Attach to a job and refresh its progress until it finishes or you detach.
    Watch {
        /// Project identifier.
        project_id: i64,
        /// Job identifier.
        job_id: i64,
        /// Let SIGQUIT (Ctrl-\) delete the job on the server instead of just detaching.
        #[arg(long)]
        delete_on_quit: bool,
        /// Seconds between refreshes (default from config, normally 5).
        #[arg(long, value_name = "SECS", value_parser = clap::value_parser!(u64).range(1..))]
        interval: Option<u64>,
    },

    /// Print the job's progress once and exit.
    Show {
        /// Project identifier.
        project_id: i64,
        /// Job identifier.
        job_id: i64,
    },

    /// Print shell completions to stdout.
    Completions {
        /// Target shell.
        shell: Shell,
    },
}

impl CliCommand {
    pub async fn run_from_args() -> Result<()> {
        let cli = Cli::parse();

        if let CliCommand::Completions { shell } = cli.command {
            run_completions(shell, &mut Cli::command());
            return Ok(());
        }

        let cfg = config::load_or_init()?;
        tracing::debug!("loaded config: {:?}", cfg);
        let client = connect(&cfg, cli.server.as_deref(), cli.token.as_deref())?;

        match cli.command {
            CliCommand::Watch {
                project_id,
                job_id,
                delete_on_quit,
                interval,
            } => run_watch(client, &cfg, project_id, job_id, delete_on_quit, interval).await?,
            CliCommand::Show { project_id, job_id } => {
                run_show(client, &cfg, project_id, job_id).await?
            }
            CliCommand::Completions { .. } => {}
        }

        Ok(())
    }
}

/// Command-line flags win over config.toml for both server and token.
fn connect(cfg: &MonitorConfig, server: Option<&str>, token: Option<&str>) -> Result<HttpClient> {
    let server = server
        .or(cfg.server_url.as_deref())
        .context("no server configured; pass --server or set server_url in config.toml")?;
    let token = token
        .or(cfg.token.as_deref())
        .context("no API token configured; pass --token or set token in config.toml")?;
    HttpClient::new(server, token, cfg).context("invalid server address")
}

#[cfg(test)]
mod tests;
