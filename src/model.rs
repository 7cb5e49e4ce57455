use chrono::{DateTime, FixedOffset, Utc};
use serde::Serialize;
use std::fmt;

/// Date layout used in every report, e.g. `2021-03-04 10:11:12+01:00`.
pub const REPORT_DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S%:z";

/// One historical revision: the commit id and its committer date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommitRecord {
    id: String,
    timestamp: DateTime<FixedOffset>,
}

impl CommitRecord {
    pub fn new(id: impl Into<String>, timestamp: DateTime<FixedOffset>) -> Self {
        Self {
            id: id.into(),
            timestamp,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn timestamp(&self) -> DateTime<FixedOffset> {
        self.timestamp
    }

    pub fn short_id(&self) -> &str {
        let end = self.id.char_indices().nth(8).map(|(i, _)| i).unwrap_or(self.id.len());
        &self.id[..end]
    }

    pub fn date_string(&self) -> String {
        self.timestamp.format(REPORT_DATE_FORMAT).to_string()
    }
}

impl fmt::Display for CommitRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.id, self.date_string())
    }
}

/// Orders commits for forward replay.
///
/// `git log` lists newest first, so the list is reversed before a stable sort on
/// the commit instant; commits sharing a timestamp keep their chronological
/// (reversed log) order.
pub fn sort_chronologically(commits: &mut Vec<CommitRecord>) {
    commits.reverse();
    commits.sort_by_key(|c| c.timestamp);
}

/// Inclusive bounds on the commit instant; a missing bound is open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateRange {
    pub since: Option<DateTime<Utc>>,
    pub until: Option<DateTime<Utc>>,
}

impl DateRange {
    pub fn is_unbounded(&self) -> bool {
        *self == Self::default()
    }

    pub fn contains(&self, timestamp: &DateTime<FixedOffset>) -> bool {
        let instant = timestamp.with_timezone(&Utc);
        self.since.map_or(true, |since| since <= instant)
            && self.until.map_or(true, |until| instant <= until)
    }
}
