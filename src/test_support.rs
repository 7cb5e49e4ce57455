//! Test helpers: a scripted in-memory git and throwaway real repositories.

use crate::process::{CommandOutput, CommandRunner};
use std::cell::{Cell, RefCell};
use std::fs::{self, File};
use std::io::Write;
use std::path::Path;
use std::process::Command;

/// Scripted stand-in for the `git` binary.
///
/// Tracks a fake HEAD and three kinds of local change, each cleared only by
/// the git command that clears it for real:
///
/// - unstaged edits: `checkout HEAD -- .` or `checkout -- .`
/// - staged edits: `checkout HEAD -- .`; `reset` turns them back into unstaged
///   edits, which `checkout -- .` only discards when it runs after the reset
/// - untracked files: `clean`
///
/// `checkout -q <rev>` moves HEAD; `status` lists whatever is left.
pub struct FakeGit {
    log: String,
    responses: Vec<(String, CommandOutput)>,
    failing_checkouts: Vec<String>,
    head: RefCell<String>,
    modified: Cell<bool>,
    staged: Cell<bool>,
    untracked: Cell<bool>,
    calls: RefCell<Vec<String>>,
}

impl FakeGit {
    pub fn new() -> Self {
        Self {
            log: String::new(),
            responses: Vec::new(),
            failing_checkouts: Vec::new(),
            head: RefCell::new("HEAD0".to_string()),
            modified: Cell::new(false),
            staged: Cell::new(false),
            untracked: Cell::new(false),
            calls: RefCell::new(Vec::new()),
        }
    }

    /// `git log` output, given as `(id, rfc3339)` pairs in log order.
    pub fn with_log(mut self, commits: &[(&str, &str)]) -> Self {
        self.log = commits
            .iter()
            .map(|(id, date)| format!("{id} {date}\n"))
            .collect();
        self
    }

    /// Canned output for any call whose joined arguments start with `prefix`.
    pub fn respond(mut self, prefix: &str, output: CommandOutput) -> Self {
        self.responses.push((prefix.to_string(), output));
        self
    }

    pub fn fail_checkout(mut self, rev: &str) -> Self {
        self.failing_checkouts.push(rev.to_string());
        self
    }

    /// An unstaged edit plus an untracked file.
    pub fn set_dirty(&self, dirty: bool) {
        self.modified.set(dirty);
        self.untracked.set(dirty);
    }

    pub fn stage_edit(&self) {
        self.staged.set(true);
    }

    pub fn is_dirty(&self) -> bool {
        self.modified.get() || self.staged.get() || self.untracked.get()
    }

    fn status(&self) -> String {
        let mut out = String::new();
        if self.staged.get() {
            out.push_str("M  b.py\n");
        }
        if self.modified.get() {
            out.push_str(" M a.py\n");
        }
        if self.untracked.get() {
            out.push_str("?? stray.py\n");
        }
        out
    }

    pub fn head(&self) -> String {
        self.head.borrow().clone()
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }

    /// Revisions passed to `git checkout -q`, in call order.
    pub fn switches(&self) -> Vec<String> {
        self.calls
            .borrow()
            .iter()
            .filter_map(|c| c.strip_prefix("checkout -q "))
            .map(str::to_string)
            .collect()
    }
}

impl CommandRunner for FakeGit {
    fn run(&self, program: &str, args: &[&str], _suppress_errors: bool) -> CommandOutput {
        let line = args.join(" ");
        self.calls.borrow_mut().push(line.clone());

        if program != "git" {
            return CommandOutput::failed(format!("{program}: command not found"));
        }
        if let Some((_, out)) = self.responses.iter().find(|(p, _)| line.starts_with(p.as_str())) {
            return out.clone();
        }

        match args {
            ["status", ..] => CommandOutput::ok(self.status()),
            ["log", ..] => CommandOutput::ok(self.log.clone()),
            ["checkout", "-q", rev] => {
                if self.failing_checkouts.iter().any(|f| f.as_str() == *rev) {
                    CommandOutput::failed(format!("error: pathspec '{rev}' did not match"))
                } else {
                    *self.head.borrow_mut() = rev.to_string();
                    CommandOutput::ok("")
                }
            }
            ["checkout", "HEAD", "--", ..] => {
                self.modified.set(false);
                self.staged.set(false);
                CommandOutput::ok("")
            }
            ["checkout", "--", ..] => {
                self.modified.set(false);
                CommandOutput::ok("")
            }
            ["reset", ..] => {
                if self.staged.replace(false) {
                    self.modified.set(true);
                }
                CommandOutput::ok("")
            }
            ["clean", ..] => {
                self.untracked.set(false);
                CommandOutput::ok("")
            }
            ["rev-parse", "HEAD"] => CommandOutput::ok(format!("{}\n", self.head.borrow())),
            ["symbolic-ref", ..] => CommandOutput::ok("main\n"),
            _ => CommandOutput::ok(""),
        }
    }
}

pub fn has_git() -> bool {
    Command::new("git").arg("--version").output().is_ok()
}

pub fn git(dir: &Path, args: &[&str]) {
    assert!(Command::new("git")
        .args(args)
        .current_dir(dir)
        .status()
        .unwrap()
        .success());
}

pub fn init_git_repo(dir: &Path) {
    git(dir, &["init", "-q"]);
    git(dir, &["config", "core.autocrlf", "false"]);
    git(dir, &["config", "user.email", "you@example.com"]);
    git(dir, &["config", "user.name", "Your Name"]);
    git(dir, &["config", "commit.gpgsign", "false"]);
}

pub fn commit_file(dir: &Path, name: &str, content: &str) {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    let mut f = File::create(&path).unwrap();
    f.write_all(content.as_bytes()).unwrap();
    f.sync_all().unwrap();
    git(dir, &["add", "."]);
    git(dir, &["commit", "-q", "-m", &format!("add {name}")]);
}

pub fn git_head(dir: &Path) -> String {
    let out = Command::new("git")
        .args(["rev-parse", "HEAD"])
        .current_dir(dir)
        .output()
        .unwrap();
    String::from_utf8_lossy(&out.stdout).trim().to_string()
}
