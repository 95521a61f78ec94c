//! Freshness check for device reports.

use std::time::Duration;

use crate::model::Micro;

/// Devices silent for longer than this no longer count toward rate.
pub const DEFAULT_STALENESS_WINDOW: Duration = Duration::from_secs(120);

/// True iff `now - updated_at <= window` (boundary inclusive). Reports
/// timestamped in the future are treated as fresh.
pub fn is_fresh(micro: &Micro, now: i64, window: Duration) -> bool {
    let age = now.saturating_sub(micro.status.updated_at);
    age <= window.as_secs().min(i64::MAX as u64) as i64
}
