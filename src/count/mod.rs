pub mod pygount;
pub mod simple;

pub use pygount::PygountCounter;
pub use simple::{count_text, SimpleCounter};

use crate::error::Result;

/// Measures lines of code in the working tree as it is right now.
pub trait LineCounter {
    fn count_lines(&self, filter: &FileFilter) -> Result<u64>;
}

impl<C: LineCounter + ?Sized> LineCounter for Box<C> {
    fn count_lines(&self, filter: &FileFilter) -> Result<u64> {
        (**self).count_lines(filter)
    }
}

/// Which files take part in a count.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileFilter {
    extensions: Vec<String>,
    excludes: Vec<String>,
}

impl FileFilter {
    /// `suffixes` is a comma-separated extension list such as `"py, rs"`.
    pub fn new<S: AsRef<str>>(suffixes: &str, excludes: &[S]) -> Self {
        let mut extensions: Vec<String> = suffixes
            .split(',')
            .map(|s| s.trim().trim_start_matches('.'))
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();
        extensions.sort();
        extensions.dedup();

        let mut prefixes: Vec<String> = excludes
            .iter()
            .map(|e| e.as_ref().trim())
            .filter(|e| !e.is_empty())
            .map(normalize_prefix)
            .collect();
        prefixes.dedup();

        Self {
            extensions,
            excludes: prefixes,
        }
    }

    pub fn extensions(&self) -> &[String] {
        &self.extensions
    }

    pub fn excludes(&self) -> &[String] {
        &self.excludes
    }

    /// `file_name` ends with `.<ext>` for some extension.
    pub fn matches_name(&self, file_name: &str) -> bool {
        self.extensions.iter().any(|ext| {
            file_name
                .strip_suffix(ext.as_str())
                .is_some_and(|stem| stem.ends_with('.'))
        })
    }

    /// `rel_path` is root-relative with `/` separators, e.g. `./src/a.py`.
    pub fn is_excluded(&self, rel_path: &str) -> bool {
        self.excludes.iter().any(|prefix| rel_path.starts_with(prefix.as_str()))
    }
}

fn normalize_prefix(prefix: &str) -> String {
    let prefix = prefix.replace('\\', "/");
    if prefix.starts_with("./") {
        prefix
    } else {
        format!("./{}", prefix.trim_start_matches('/'))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum CounterKind {
    /// Count non-blank lines not starting with `#`
    Simple,
    /// Sum the per-file report of the external `pygount` tool
    Pygount,
}
