//! Job progress aggregation.
//!
//! Reduces a job's task/micro tree to one report per tick:
//! reducer (keyspace totals + rate) → staleness filter (which devices count)
//! → ETA estimator → report (status, percent, new errors, cracked stats).

mod eta;
mod reducer;
mod report;
mod staleness;

pub use eta::{estimate_eta, Eta};
pub use reducer::{reduce_tasks, ProgressTotals};
pub use report::{build_report, CrackedStats, CrackedTracker, ErrorWatermark, ProgressReport};
pub use staleness::{is_fresh, DEFAULT_STALENESS_WINDOW};

/// Current wall-clock time in Unix seconds.
pub fn unix_now() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}
