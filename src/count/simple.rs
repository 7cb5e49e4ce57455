use super::{FileFilter, LineCounter};
use crate::error::Result;
use ignore::WalkBuilder;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// In-process counter: non-blank lines whose trimmed text does not start
/// with `#`.
///
/// Unreadable files count as zero lines and are reported with a warning.
pub struct SimpleCounter {
    root: PathBuf,
}

impl SimpleCounter {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// Files under the root selected by `filter`, sorted.
    pub fn matching_files(&self, filter: &FileFilter) -> Vec<PathBuf> {
        let walker = WalkBuilder::new(&self.root)
            .standard_filters(false)
            .follow_links(false)
            .filter_entry(|entry| entry.file_name() != ".git")
            .build();

        let mut files = Vec::new();
        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!(event = "count.walk_error", error = %e);
                    continue;
                }
            };
            if !entry.file_type().is_some_and(|t| t.is_file()) {
                continue;
            }
            let name = entry.file_name().to_string_lossy();
            if !filter.matches_name(&name) {
                continue;
            }
            if filter.is_excluded(&self.display_path(entry.path())) {
                continue;
            }
            files.push(entry.into_path());
        }
        files.sort();
        files
    }

    /// `./`-rooted path with `/` separators, the form exclusion prefixes use.
    fn display_path(&self, path: &Path) -> String {
        let rel = path.strip_prefix(&self.root).unwrap_or(path);
        let parts: Vec<_> = rel.components().map(|c| c.as_os_str().to_string_lossy()).collect();
        format!("./{}", parts.join("/"))
    }
}

impl LineCounter for SimpleCounter {
    fn count_lines(&self, filter: &FileFilter) -> Result<u64> {
        let mut total = 0u64;
        for path in self.matching_files(filter) {
            match std::fs::read(&path) {
                Ok(bytes) => total += count_text(&String::from_utf8_lossy(&bytes)),
                Err(e) => warn!(
                    event = "count.read_failed",
                    path = %path.display(),
                    error = %e,
                    "unreadable file counted as 0 lines"
                ),
            }
        }
        debug!(event = "count.completed", root = %self.root.display(), lines = total);
        Ok(total)
    }
}

/// Lines that are neither blank nor `#` comments.
pub fn count_text(text: &str) -> u64 {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .count() as u64
}
