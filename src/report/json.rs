use super::ReportSink;
use crate::error::Result;
use crate::model::CommitRecord;
use std::collections::HashSet;
use std::io::Write;
use tracing::warn;

/// Writes `{ "<date>": <lines>, ... }`.
///
/// Entries are streamed; the separator is written before every entry but the
/// first, so the document never ends in a dangling comma. Commits sharing a
/// timestamp repeat a date key; every repeat is written and logged, and most
/// JSON readers keep the last value. With `sha1` the commit id is prepended
/// and keys stay unique.
pub struct JsonSink<W: Write> {
    out: W,
    sha1: bool,
    entries: usize,
    keys: HashSet<String>,
    duplicates: usize,
}

impl<W: Write> JsonSink<W> {
    pub fn new(out: W, sha1: bool) -> Self {
        Self {
            out,
            sha1,
            entries: 0,
            keys: HashSet::new(),
            duplicates: 0,
        }
    }
}

impl<W: Write> ReportSink for JsonSink<W> {
    fn begin(&mut self) -> Result<()> {
        write!(self.out, "{{")?;
        Ok(())
    }

    fn emit(&mut self, commit: &CommitRecord, lines: u64) -> Result<()> {
        let key = if self.sha1 {
            format!("{} {}", commit.id(), commit.date_string())
        } else {
            commit.date_string()
        };
        if !self.keys.insert(key.clone()) {
            self.duplicates += 1;
            warn!(
                event = "report.json.duplicate_key",
                key = %key,
                commit = %commit.id(),
                "duplicate key; rerun with --sha1 to keep every commit"
            );
        }
        let separator = if self.entries == 0 { "\n" } else { ",\n" };
        write!(self.out, "{separator}  {}: {lines}", serde_json::to_string(&key)?)?;
        self.entries += 1;
        self.out.flush()?;
        Ok(())
    }

    fn end(&mut self) -> Result<()> {
        if self.entries == 0 {
            writeln!(self.out, "}}")?;
        } else {
            writeln!(self.out, "\n}}")?;
        }
        if self.duplicates > 0 {
            warn!(
                event = "report.json.duplicates_written",
                count = self.duplicates,
                "{} entries share a key with an earlier entry",
                self.duplicates
            );
        }
        self.out.flush()?;
        Ok(())
    }
}
