//! Working-tree state machine.
//!
//! The replay mutates the user's working tree in place, so every switch is
//! wrapped in a cleanup protocol: clean before switching when the tree is not
//! already clean, switch, then clean again unconditionally. Cleanup is a fixed
//! sequence of best-effort steps; a failed step is recorded and the remaining
//! steps still run.

use crate::model::CommitRecord;
use crate::process::{CommandOutput, CommandRunner};
use tracing::{debug, warn};

/// Last known condition of the working tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TreeState {
    Unknown,
    Dirty,
    Clean,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CleanStep {
    DiscardTracked,
    Unstage,
    RemoveUntracked,
    SubmoduleDiscard,
    SubmoduleUnstage,
    SubmoduleRemove,
    SubmoduleSync,
}

impl CleanStep {
    pub const ALL: [CleanStep; 7] = [
        CleanStep::DiscardTracked,
        CleanStep::Unstage,
        CleanStep::RemoveUntracked,
        CleanStep::SubmoduleDiscard,
        CleanStep::SubmoduleUnstage,
        CleanStep::SubmoduleRemove,
        CleanStep::SubmoduleSync,
    ];

    pub fn label(self) -> &'static str {
        match self {
            CleanStep::DiscardTracked => "discard tracked changes",
            CleanStep::Unstage => "unstage",
            CleanStep::RemoveUntracked => "remove untracked files",
            CleanStep::SubmoduleDiscard => "discard submodule changes",
            CleanStep::SubmoduleUnstage => "unstage in submodules",
            CleanStep::SubmoduleRemove => "remove untracked files in submodules",
            CleanStep::SubmoduleSync => "sync submodules",
        }
    }

    /// `git` arguments for this step. `preserved` are root-relative paths that
    /// `git clean` must leave alone.
    fn args(self, preserved: &[String]) -> Vec<String> {
        // `|| :` keeps foreach going when one submodule fails
        let foreach = |cmd: &str| {
            vec![
                "submodule".to_string(),
                "foreach".to_string(),
                "--quiet".to_string(),
                "--recursive".to_string(),
                format!("{cmd} || :"),
            ]
        };
        match self {
            // from HEAD, not the index, so staged edits are discarded too
            CleanStep::DiscardTracked => strings(&["checkout", "HEAD", "--", "."]),
            CleanStep::Unstage => strings(&["reset", "-q", "."]),
            CleanStep::RemoveUntracked => {
                let mut args = strings(&["clean", "-ffdxq"]);
                for path in preserved {
                    args.push("-e".to_string());
                    args.push(format!("/{path}"));
                }
                args
            }
            CleanStep::SubmoduleDiscard => foreach("git checkout HEAD -- ."),
            CleanStep::SubmoduleUnstage => foreach("git reset -q ."),
            CleanStep::SubmoduleRemove => foreach("git clean -ffdxq"),
            CleanStep::SubmoduleSync => strings(&["submodule", "update", "--checkout", "--recursive"]),
        }
    }
}

fn strings(args: &[&str]) -> Vec<String> {
    args.iter().map(|s| s.to_string()).collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepOutcome {
    pub step: CleanStep,
    pub succeeded: bool,
    pub diagnostic: String,
}

/// Step log of one `force_clean` pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CleanReport {
    pub steps: Vec<StepOutcome>,
}

impl CleanReport {
    pub fn all_succeeded(&self) -> bool {
        self.steps.iter().all(|s| s.succeeded)
    }

    pub fn failures(&self) -> impl Iterator<Item = &StepOutcome> {
        self.steps.iter().filter(|s| !s.succeeded)
    }
}

#[derive(Debug, Clone)]
pub struct CheckoutOutcome {
    /// Cleanup run before switching; `None` when the tree was already clean.
    pub pre_clean: Option<CleanReport>,
    pub switched: bool,
    pub switch_diagnostic: String,
    pub post_clean: CleanReport,
}

pub struct CheckoutController<R> {
    runner: R,
    state: TreeState,
    head: Option<String>,
    preserved: Vec<String>,
}

impl<R: CommandRunner> CheckoutController<R> {
    pub fn new(runner: R) -> Self {
        Self {
            runner,
            state: TreeState::Unknown,
            head: None,
            preserved: Vec::new(),
        }
    }

    pub fn state(&self) -> TreeState {
        self.state
    }

    /// Last revision this controller switched to successfully.
    pub fn switched_to(&self) -> Option<&str> {
        self.head.as_deref()
    }

    /// Keeps a root-relative path (e.g. the report file) out of `git clean`.
    pub fn preserve(&mut self, path: impl Into<String>) {
        let path = path.into().replace('\\', "/");
        let path = path.trim_start_matches("./").trim_start_matches('/').to_string();
        if !path.is_empty() && !self.preserved.contains(&path) {
            self.preserved.push(path);
        }
    }

    pub fn probe_clean(&mut self) -> bool {
        let out = self.runner.run(
            "git",
            &["status", "--porcelain", "--untracked-files=all", "--ignore-submodules=none"],
            true,
        );
        // a failed probe carries no information, so the tree is not known clean
        let clean = out.success
            && out
                .text()
                .lines()
                .filter(|l| !l.trim().is_empty())
                .all(|l| self.is_preserved_entry(l));
        self.state = if clean { TreeState::Clean } else { TreeState::Dirty };
        debug!(event = "git.checkout.probe", clean = clean);
        clean
    }

    fn is_preserved_entry(&self, porcelain_line: &str) -> bool {
        porcelain_line
            .get(3..)
            .map(|path| self.preserved.iter().any(|p| p == path.trim_matches('"')))
            .unwrap_or(false)
    }

    pub fn force_clean(&mut self) -> CleanReport {
        let mut report = CleanReport::default();
        for step in CleanStep::ALL {
            let args = step.args(&self.preserved);
            let args: Vec<&str> = args.iter().map(String::as_str).collect();
            let out = self.runner.run("git", &args, true);
            if !out.success {
                warn!(
                    event = "git.checkout.clean_step_failed",
                    step = step.label(),
                    stderr = %out.diagnostic(),
                );
            }
            report.steps.push(StepOutcome {
                step,
                succeeded: out.success,
                diagnostic: out.diagnostic().to_string(),
            });
        }
        self.state = if report.all_succeeded() {
            TreeState::Clean
        } else {
            TreeState::Unknown
        };
        report
    }

    pub fn checkout(&mut self, commit: &CommitRecord) -> CheckoutOutcome {
        self.switch_to(commit.id())
    }

    /// Makes the working tree reflect `rev`. Never verifies the result.
    pub fn switch_to(&mut self, rev: &str) -> CheckoutOutcome {
        let pre_clean = if self.probe_clean() {
            None
        } else {
            Some(self.force_clean())
        };

        let out: CommandOutput = self.runner.run("git", &["checkout", "-q", rev], true);
        if out.success {
            self.head = Some(rev.to_string());
        } else {
            warn!(
                event = "git.checkout.switch_failed",
                rev = rev,
                stderr = %out.diagnostic(),
            );
        }

        let post_clean = self.force_clean();

        CheckoutOutcome {
            pre_clean,
            switched: out.success,
            switch_diagnostic: out.diagnostic().to_string(),
            post_clean,
        }
    }

    /// Commit id HEAD currently resolves to.
    pub fn head(&self) -> Option<String> {
        let out = self.runner.run("git", &["rev-parse", "HEAD"], true);
        let id = out.text().trim();
        (out.success && !id.is_empty()).then(|| id.to_string())
    }

    /// Branch name HEAD points at, or the detached commit id.
    pub fn current_ref(&self) -> Option<String> {
        let out = self.runner.run("git", &["symbolic-ref", "-q", "--short", "HEAD"], true);
        let name = out.text().trim();
        if out.success && !name.is_empty() {
            return Some(name.to_string());
        }
        self.head()
    }
}
