use crate::error::{LocError, Result};
use crate::model::{CommitRecord, DateRange};
use crate::process::CommandRunner;
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use std::time::Duration;
use tracing::{debug, warn};

/// `%H` is the full hash, `%cI` the strict ISO 8601 committer date.
const LOG_FORMAT: &str = "--format=%H %cI";

pub struct HistoryWalker<R> {
    runner: R,
}

impl<R: CommandRunner> HistoryWalker<R> {
    pub fn new(runner: R) -> Self {
        Self { runner }
    }

    /// Every commit reachable from HEAD, in `git log` order (newest first).
    ///
    /// A failing `git log` yields an empty list.
    pub fn list_commits(&self) -> Vec<CommitRecord> {
        let out = self.runner.run("git", &["log", LOG_FORMAT], true);
        if !out.success {
            warn!(
                event = "git.history.log_failed",
                stderr = %out.diagnostic(),
                "git log failed; treating history as empty"
            );
        }
        parse_log(out.text())
    }

    /// Resolves `--since`/`--until` into instants. Each bound is a date, a
    /// relative age such as `3 weeks ago` or `90d`, or a revision whose
    /// committer date is used.
    pub fn resolve_range(&self, since: Option<&str>, until: Option<&str>) -> Result<DateRange> {
        let range = DateRange {
            since: since.map(|s| self.resolve_instant(s)).transpose()?,
            until: until.map(|u| self.resolve_instant(u)).transpose()?,
        };
        match (range.since, range.until) {
            (Some(since), Some(until)) if since > until => Err(LocError::InvalidDate(format!(
                "--since ({since}) is later than --until ({until})"
            ))),
            _ => Ok(range),
        }
    }

    fn resolve_instant(&self, input: &str) -> Result<DateTime<Utc>> {
        let input = input.trim();
        if let Some(instant) = parse_calendar_date(input) {
            return Ok(instant);
        }
        if let Some(age) = parse_age(input) {
            let age = age.map_err(|detail| LocError::InvalidDate(format!("'{input}': {detail}")))?;
            return chrono::Duration::from_std(age)
                .ok()
                .and_then(|age| Utc::now().checked_sub_signed(age))
                .ok_or_else(|| LocError::InvalidDate(format!("'{input}' reaches before any representable date")));
        }
        self.revision_date(input)
    }

    fn revision_date(&self, rev: &str) -> Result<DateTime<Utc>> {
        let out = self.runner.run("git", &["log", "-1", "--format=%cI", rev], true);
        let text = out.text().trim();
        if !out.success || text.is_empty() {
            return Err(LocError::Parse(format!(
                "'{rev}' is neither a date nor a revision: {}",
                out.diagnostic()
            )));
        }
        DateTime::parse_from_rfc3339(text)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| LocError::InvalidDate(format!("committer date '{text}' of {rev}: {e}")))
    }
}

/// `2021-03-04T10:00:00+01:00` or `2021-03-04` (midnight UTC).
fn parse_calendar_date(input: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
        return Some(dt.with_timezone(&Utc));
    }
    let day = NaiveDate::parse_from_str(input, "%Y-%m-%d").ok()?;
    Some(Utc.from_utc_datetime(&day.and_hms_opt(0, 0, 0)?))
}

/// Age of a relative date: `N day(s)/week(s)/month(s) ago` (a month is 30
/// days) or a humantime span such as `90d`, `-2weeks`, `36h ago`.
///
/// `None` means the input is not a relative date at all; `Some(Err(_))` means
/// it is one but the age does not fit in a `Duration`.
fn parse_age(input: &str) -> Option<std::result::Result<Duration, String>> {
    let lowered = input.to_lowercase();
    let span = lowered.strip_suffix("ago").unwrap_or(&lowered).trim();
    let span = span.strip_prefix('-').unwrap_or(span);

    if let Some((count, unit)) = span.split_once(char::is_whitespace) {
        let days_per_unit = match unit.trim().trim_end_matches('s') {
            "day" => Some(1u64),
            "week" => Some(7),
            "month" => Some(30),
            _ => None,
        };
        if let (Some(per_unit), Ok(count)) = (days_per_unit, count.parse::<u64>()) {
            return Some(
                count
                    .checked_mul(per_unit)
                    .and_then(|days| days.checked_mul(SECS_PER_DAY))
                    .map(Duration::from_secs)
                    .ok_or_else(|| format!("{count} {unit} is out of range")),
            );
        }
    }

    match humantime::parse_duration(span) {
        Ok(age) => Some(Ok(age)),
        Err(humantime::DurationError::NumberOverflow) => Some(Err("number out of range".to_string())),
        Err(_) => None,
    }
}

const SECS_PER_DAY: u64 = 86_400;

/// Parses `git log` output, skipping blank and malformed lines.
pub fn parse_log(output: &str) -> Vec<CommitRecord> {
    output
        .lines()
        .filter(|line| !line.trim().is_empty())
        .filter_map(|line| {
            let parsed = parse_log_line(line);
            if parsed.is_none() {
                debug!(event = "git.history.line_skipped", line = line, "malformed log line");
            }
            parsed
        })
        .collect()
}

pub fn parse_log_line(line: &str) -> Option<CommitRecord> {
    let mut parts = line.split_whitespace();
    let id = parts.next()?;
    let date = parts.next()?;
    if parts.next().is_some() || !id.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    let timestamp = DateTime::parse_from_rfc3339(date).ok()?;
    Some(CommitRecord::new(id, timestamp))
}
