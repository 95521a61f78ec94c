//! CLI command handlers, one file per command.

mod completions;
mod show;
mod watch;

pub use completions::run_completions;
pub use show::run_show;
pub use watch::run_watch;
