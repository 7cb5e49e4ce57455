use super::{FileFilter, LineCounter};
use crate::error::Result;
use crate::process::CommandRunner;
use std::sync::Once;
use tracing::warn;

/// Delegates counting to the external `pygount` tool and sums its per-file
/// report (first column of every line).
pub struct PygountCounter<R> {
    runner: R,
    excludes_warning: Once,
}

impl<R: CommandRunner> PygountCounter<R> {
    pub fn new(runner: R) -> Self {
        Self {
            runner,
            excludes_warning: Once::new(),
        }
    }
}

impl<R: CommandRunner> LineCounter for PygountCounter<R> {
    fn count_lines(&self, filter: &FileFilter) -> Result<u64> {
        if filter.extensions().is_empty() {
            return Ok(0);
        }
        if !filter.excludes().is_empty() {
            self.excludes_warning.call_once(|| {
                warn!(
                    event = "count.pygount.excludes_ignored",
                    "exclusion prefixes are not applied by the pygount counter"
                )
            });
        }

        let suffix = format!("--suffix={}", filter.extensions().join(","));
        let out = self.runner.run("pygount", &[suffix.as_str()], true);
        if !out.success {
            warn!(
                event = "count.pygount.failed",
                stderr = %out.diagnostic(),
                "pygount failed; counting 0 lines"
            );
        }
        Ok(sum_report(out.text()))
    }
}

/// Sums the leading integer of each report line; other lines are skipped.
pub fn sum_report(report: &str) -> u64 {
    report
        .lines()
        .filter_map(|line| line.split_whitespace().next())
        .filter_map(|first| first.parse::<u64>().ok())
        .sum()
}
