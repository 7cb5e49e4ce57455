pub mod csv;
pub mod json;

pub use self::csv::CsvSink;
pub use self::json::JsonSink;

use crate::error::Result;
use crate::model::CommitRecord;
use std::fmt;
use std::io::Write;

pub const DEFAULT_SEPARATOR: &str = ";";

/// Incremental writer for the `(commit, lines)` time series.
pub trait ReportSink {
    fn begin(&mut self) -> Result<()>;
    fn emit(&mut self, commit: &CommitRecord, lines: u64) -> Result<()>;
    /// Finishes the document and flushes. The stream itself stays open.
    fn end(&mut self) -> Result<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum ReportFormat {
    #[default]
    Csv,
    Json,
}

impl fmt::Display for ReportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReportFormat::Csv => write!(f, "csv"),
            ReportFormat::Json => write!(f, "json"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ReportOptions {
    pub format: ReportFormat,
    /// Include the commit id (CSV column, JSON key prefix).
    pub sha1: bool,
    pub separator: String,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self {
            format: ReportFormat::Csv,
            sha1: false,
            separator: DEFAULT_SEPARATOR.to_string(),
        }
    }
}

pub fn sink_for<'a, W: Write + 'a>(options: &ReportOptions, out: W) -> Box<dyn ReportSink + 'a> {
    match options.format {
        ReportFormat::Csv => Box::new(CsvSink::new(out, options.sha1, &options.separator)),
        ReportFormat::Json => Box::new(JsonSink::new(out, options.sha1)),
    }
}
