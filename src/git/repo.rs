use crate::error::{LocError, Result};
use gix::discover;
use std::path::{Path, PathBuf};

/// The working tree whose history is replayed.
pub struct GitRepo {
    path: PathBuf,
}

impl GitRepo {
    /// Open a repository at `path`, or current dir if `None`
    pub fn open<P: AsRef<Path>>(path: Option<P>) -> Result<Self> {
        let start = match path {
            Some(p) => p.as_ref().to_path_buf(),
            None => std::env::current_dir()?,
        };

        let repo = discover(&start)?;
        let workdir = repo
            .workdir()
            .ok_or_else(|| LocError::NotAWorkTree(repo.path().display().to_string()))?;
        let path = std::fs::canonicalize(workdir)?;

        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Path of `file` relative to the working tree root, if it lives inside it.
    ///
    /// `file` must exist so it can be canonicalized.
    pub fn relative_path(&self, file: &Path) -> Option<PathBuf> {
        let file = std::fs::canonicalize(file).ok()?;
        file.strip_prefix(&self.path).ok().map(Path::to_path_buf)
    }
}
