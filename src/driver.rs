//! Replays the history: list, sort, then checkout, count and emit per commit.

use crate::count::{FileFilter, LineCounter};
use crate::error::{LocError, Result};
use crate::git::{CheckoutController, HistoryWalker, TreeState};
use crate::model::{sort_chronologically, CommitRecord};
use crate::process::CommandRunner;
use crate::report::{sink_for, ReportOptions, ReportSink};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::io::Write;
use tracing::{info, warn};

/// What to do when a commit cannot be checked out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// Keep going; the row reports whatever the tree holds.
    #[default]
    Tolerant,
    /// Abort when the switch fails or HEAD ends up elsewhere.
    Strict,
}

#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    pub filter: FileFilter,
    pub report: ReportOptions,
    pub since: Option<String>,
    pub until: Option<String>,
    pub policy: FailurePolicy,
    /// Switch back to the branch (or commit) that was checked out before the run.
    pub restore: bool,
    /// Root-relative paths `git clean` must not delete, such as the report file.
    pub preserve: Vec<String>,
    pub progress: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub commits: usize,
    pub failed_checkouts: usize,
    /// Checkouts that found the tree dirty and cleaned it first.
    pub dirty_cleanups: usize,
    /// Commits counted on a tree whose post-switch cleanup had a failed step.
    pub unclean_checkouts: usize,
    pub restored_to: Option<String>,
}

pub struct Driver<R, C> {
    runner: R,
    counter: C,
    options: RunOptions,
}

impl<R: CommandRunner, C: LineCounter> Driver<R, C> {
    pub fn new(runner: R, counter: C, options: RunOptions) -> Self {
        Self {
            runner,
            counter,
            options,
        }
    }

    /// Commits to replay, oldest first. Touches nothing on disk.
    pub fn plan(&self) -> Result<Vec<CommitRecord>> {
        let walker = HistoryWalker::new(&self.runner);
        let range = walker.resolve_range(self.options.since.as_deref(), self.options.until.as_deref())?;

        info!(event = "driver.listing_commits", "Getting commit list...");
        let mut commits = walker.list_commits();
        if !range.is_unbounded() {
            commits.retain(|c| range.contains(&c.timestamp()));
        }
        sort_chronologically(&mut commits);
        Ok(commits)
    }

    pub fn run<W: Write>(&self, out: W) -> Result<RunSummary> {
        let commits = self.plan()?;
        let mut sink = sink_for(&self.options.report, out);

        if commits.is_empty() {
            info!(event = "driver.empty_history", "No commits to replay");
            sink.begin()?;
            sink.end()?;
            return Ok(RunSummary::default());
        }

        let mut controller = CheckoutController::new(&self.runner);
        for path in &self.options.preserve {
            controller.preserve(path.as_str());
        }
        let original = if self.options.restore {
            controller.current_ref()
        } else {
            None
        };

        let pb = self.progress_bar(commits.len());
        sink.begin()?;
        let replayed = self.replay(&commits, &mut controller, sink.as_mut(), &pb);
        pb.finish_and_clear();

        let mut restored_to = None;
        if let Some(rev) = original {
            info!(event = "driver.restore_started", rev = %rev, "Restoring {rev}");
            let outcome = controller.switch_to(&rev);
            if outcome.switched {
                restored_to = Some(rev);
            } else {
                warn!(
                    event = "driver.restore_failed",
                    rev = %rev,
                    stderr = %outcome.switch_diagnostic,
                );
            }
        }

        let mut summary = replayed?;
        sink.end()?;
        summary.restored_to = restored_to;
        Ok(summary)
    }

    fn replay(
        &self,
        commits: &[CommitRecord],
        controller: &mut CheckoutController<&R>,
        sink: &mut dyn ReportSink,
        pb: &ProgressBar,
    ) -> Result<RunSummary> {
        let mut summary = RunSummary::default();

        for commit in commits {
            pb.set_message(commit.short_id().to_string());
            info!(event = "driver.checkout_started", commit = %commit.id(), "Checking out {commit}");

            let outcome = controller.checkout(commit);
            if outcome.pre_clean.is_some() {
                summary.dirty_cleanups += 1;
            }
            if !outcome.switched {
                summary.failed_checkouts += 1;
                if self.options.policy == FailurePolicy::Strict {
                    return Err(LocError::Checkout {
                        commit: commit.id().to_string(),
                        detail: outcome.switch_diagnostic,
                    });
                }
            } else if self.options.policy == FailurePolicy::Strict {
                match controller.head() {
                    Some(head) if head == commit.id() => {}
                    other => {
                        return Err(LocError::Checkout {
                            commit: commit.id().to_string(),
                            detail: format!("HEAD is at {}", other.as_deref().unwrap_or("an unknown revision")),
                        })
                    }
                }
            }

            if controller.state() != TreeState::Clean {
                summary.unclean_checkouts += 1;
                let steps: Vec<_> = outcome.post_clean.failures().map(|s| s.step.label()).collect();
                warn!(
                    event = "driver.tree_not_clean",
                    commit = %commit.id(),
                    failed_steps = ?steps,
                    "counting a tree that may hold leftovers"
                );
            }

            info!(event = "driver.count_started", "Getting LOCs");
            let lines = self.counter.count_lines(&self.options.filter)?;
            info!(event = "driver.count_completed", lines = lines, "LOCs: {lines}");

            sink.emit(commit, lines)?;
            summary.commits += 1;
            pb.inc(1);
        }

        Ok(summary)
    }

    fn progress_bar(&self, len: usize) -> ProgressBar {
        if !self.options.progress {
            return ProgressBar::hidden();
        }
        let pb = ProgressBar::new(len as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{bar:30.cyan/blue}] {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );
        pb
    }
}
