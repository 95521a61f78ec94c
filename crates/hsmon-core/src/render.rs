//! Text rendering of a progress report (dotted-label block).

use std::fmt::Write as _;

use chrono::{DateTime, Utc};

use crate::keyspace::KeyspaceValue;
use crate::model::JobStatus;
use crate::progress::{Eta, ProgressReport};

const HASH_RATE_PREFIXES: [&str; 9] = ["", "K", "M", "G", "T", "P", "E", "Z", "Y"];

/// `"{:.2} {prefix}H/s"`, scaling by 1000 per prefix.
pub fn format_hash_rate(speed: &KeyspaceValue) -> String {
    let mut value = speed.to_f64();
    let mut idx = 0;
    while value >= 1000.0 && idx < HASH_RATE_PREFIXES.len() - 1 {
        value /= 1000.0;
        idx += 1;
    }
    format!("{:.2} {}H/s", value, HASH_RATE_PREFIXES[idx])
}

/// Human relative time: `now`, `5 minutes ago`, `in 2 hours`.
pub fn humanize_relative(ts: i64, now: i64) -> String {
    let delta = now.saturating_sub(ts);
    if delta == 0 {
        return "now".to_string();
    }
    let magnitude = delta.unsigned_abs();
    let (n, unit) = match magnitude {
        0..=59 => (magnitude, "second"),
        60..=3_599 => (magnitude / 60, "minute"),
        3_600..=86_399 => (magnitude / 3_600, "hour"),
        86_400..=604_799 => (magnitude / 86_400, "day"),
        604_800..=2_591_999 => (magnitude / 604_800, "week"),
        2_592_000..=31_535_999 => (magnitude / 2_592_000, "month"),
        _ => (magnitude / 31_536_000, "year"),
    };
    let plural = if n == 1 { "" } else { "s" };
    if delta > 0 {
        format!("{} {}{} ago", n, unit, plural)
    } else {
        format!("in {} {}{}", n, unit, plural)
    }
}

/// Absolute UTC date in Unix `date` layout followed by the relative offset,
/// e.g. `Tue Nov 14 22:13:20 UTC 2023 (5 minutes ago)`. Timestamps outside
/// chrono's range get the relative part only.
pub fn format_timestamp(ts: i64, now: i64) -> String {
    match DateTime::<Utc>::from_timestamp(ts, 0) {
        Some(at) => format!(
            "{} ({})",
            at.format("%a %b %e %H:%M:%S %Z %Y"),
            humanize_relative(ts, now)
        ),
        None => humanize_relative(ts, now),
    }
}

/// The projected completion instant, `now + eta`.
fn format_eta(eta: Eta, now: i64) -> String {
    match eta {
        Eta::Undetermined => "Undetermined".to_string(),
        Eta::Remaining(d) if d.is_zero() => "Imminent".to_string(),
        Eta::Remaining(d) => match i64::try_from(d.as_secs())
            .ok()
            .and_then(|secs| now.checked_add(secs))
        {
            Some(at) => format_timestamp(at, now),
            None => "Undetermined".to_string(),
        },
    }
}

/// Render the report the way the terminal monitor prints it. `now` anchors
/// relative timestamps and the projected completion time.
pub fn render_report(r: &ProgressReport, now: i64) -> String {
    let mut out = String::new();
    for msg in &r.new_error_messages {
        let _ = writeln!(out, "There was an error returned from an agent: {}!\n", msg);
    }

    let job = &r.job;
    let _ = writeln!(out, "Job.ID..............: {}", job.id);
    let _ = writeln!(out, "Job.Priority........: {}", job.priority);
    let _ = writeln!(out, "Job.Name............: {}", job.name);
    let _ = writeln!(out, "Job.Status..........: {}", r.status);
    if let Some(c) = &r.cracked {
        let _ = writeln!(
            out,
            "Job.Cracked.........: {}/{} ({:.2}%) hashes",
            c.recovered, c.digests, c.percent
        );
    }
    let _ = writeln!(
        out,
        "Job.Progress........: {}/{} ({:.2}%)",
        r.completed_keyspace, r.total_keyspace, r.percent_complete
    );
    let _ = writeln!(out, "Job.Errors..........: {} errors", r.total_errors);
    if let Some(c) = &r.cracked {
        let _ = writeln!(out, "Hash.Mode...........: {}", c.hash_mode);
        let _ = writeln!(out, "Hash.Target.........: {}", c.list_name);
    }
    let _ = writeln!(
        out,
        "Time.Created........: {}",
        format_timestamp(job.created_at, now)
    );
    let started = if job.first_task_time != 0 {
        format_timestamp(job.first_task_time, now)
    } else {
        "Has not started".to_string()
    };
    let _ = writeln!(out, "Time.Started........: {}", started);

    if r.status != JobStatus::Running {
        let finished = if job.last_task_time != 0 {
            format_timestamp(job.last_task_time, now)
        } else {
            "Unknown".to_string()
        };
        let _ = writeln!(out, "Time.Finished.......: {}", finished);
        return out;
    }

    let _ = writeln!(out, "Time.Estimated......: {}", format_eta(r.eta, now));
    let _ = writeln!(out, "Device.Max..........: {}", job.max_dedicated_devices);
    let _ = writeln!(out, "Device.Active.......: {}", r.active_devices);
    let _ = writeln!(out, "Device.Speed........: {}", format_hash_rate(&r.speed_per_sec));

    if let Some(c) = &r.cracked {
        if c.newly_recovered > 0 {
            let _ = writeln!(
                out,
                "Use 'hashstack lists cracked {} {}' to view the {} passwords that were cracked\n",
                job.project_id, job.list_id, c.newly_recovered
            );
        }
    }
    out
}
