use crate::count::{CounterKind, FileFilter, LineCounter, PygountCounter, SimpleCounter};
use crate::driver::{Driver, FailurePolicy, RunOptions, RunSummary};
use crate::git::GitRepo;
use crate::process::SystemRunner;
use crate::report::{ReportFormat, ReportOptions, DEFAULT_SEPARATOR};
use anyhow::{Context, Result};
use clap::{ArgAction, Parser};
use console::{style, Term};
use std::ffi::OsString;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "loc-history")]
#[command(about = "Outputs the LOCs of a git project over time. Useful for project growth analysis.")]
#[command(version)]
pub struct Cli {
    #[arg(long, help = "Path to git repository")]
    pub repo: Option<PathBuf>,

    #[arg(long, help = "The output file. If not defined, the output is shown in the terminal")]
    pub output: Option<PathBuf>,

    #[arg(long, default_value = "py", help = "Comma-separated file extensions to count")]
    pub suffix: String,

    #[arg(long, action = ArgAction::Append, help = "Path prefix excluded from counting (repeatable)")]
    pub exc: Vec<String>,

    #[arg(long, value_enum, default_value_t = ReportFormat::Csv, help = "The output format")]
    pub format: ReportFormat,

    #[arg(long, default_value = DEFAULT_SEPARATOR, help = "CSV field separator")]
    pub separator: String,

    #[arg(long, help = "Output the commit sha1 in the report (also accepted as -sha1)")]
    pub sha1: bool,

    #[arg(long, value_enum, default_value_t = CounterKind::Simple, help = "Line counting strategy")]
    pub counter: CounterKind,

    #[arg(long, help = "Start from this commit or date (RFC3339, YYYY-MM-DD, or natural language)")]
    pub since: Option<String>,

    #[arg(long, help = "End at this commit or date (RFC3339, YYYY-MM-DD, or natural language)")]
    pub until: Option<String>,

    #[arg(long, help = "Abort when a commit cannot be checked out")]
    pub strict: bool,

    #[arg(long, help = "Check the original branch out again when done")]
    pub restore: bool,

    #[arg(short, action = ArgAction::Count, help = "Output the checkout operations to the terminal (stderr); repeat for debug logs")]
    pub verbose: u8,
}

impl Cli {
    pub fn parse() -> Self {
        <Self as Parser>::parse_from(legacy_args(std::env::args_os()))
    }

    pub fn execute(self) -> Result<()> {
        crate::logging::init_logging(self.verbose);

        let repo = GitRepo::open(self.repo.as_ref()).context("Failed to open git repository")?;
        let runner = SystemRunner::new(repo.path());
        let mut options = self.run_options();

        let summary = match &self.output {
            Some(path) => {
                let file = File::create(path)
                    .with_context(|| format!("Failed to create output file {}", path.display()))?;
                if let Some(rel) = repo.relative_path(path) {
                    options.preserve.push(rel.to_string_lossy().replace('\\', "/"));
                }
                replay(self.counter, runner, repo.path(), options, BufWriter::new(file))?
            }
            None => replay(self.counter, runner, repo.path(), options, io::stdout().lock())?,
        };

        tracing::debug!(
            event = "cli.run_completed",
            summary = %serde_json::to_string(&summary).unwrap_or_default(),
        );
        self.print_summary(&summary);
        Ok(())
    }

    fn run_options(&self) -> RunOptions {
        RunOptions {
            filter: FileFilter::new(&self.suffix, &self.exc),
            report: ReportOptions {
                format: self.format,
                sha1: self.sha1,
                separator: self.separator.clone(),
            },
            since: self.since.clone(),
            until: self.until.clone(),
            policy: if self.strict {
                FailurePolicy::Strict
            } else {
                FailurePolicy::Tolerant
            },
            restore: self.restore,
            preserve: Vec::new(),
            // verbose runs log every step instead
            progress: self.verbose == 0 && Term::stderr().is_term(),
        }
    }

    fn print_summary(&self, summary: &RunSummary) {
        let term = Term::stderr();
        if !term.is_term() && self.verbose == 0 {
            return;
        }
        let mut line = format!(
            "{} {} commits replayed",
            style("Done:").bold().green(),
            style(summary.commits).cyan()
        );
        if summary.failed_checkouts > 0 {
            line.push_str(&format!(", {} failed checkouts", style(summary.failed_checkouts).red()));
        }
        if summary.unclean_checkouts > 0 {
            line.push_str(&format!(
                ", {} commits counted after a failed cleanup",
                style(summary.unclean_checkouts).yellow()
            ));
        }
        if let Some(rev) = &summary.restored_to {
            line.push_str(&format!(", restored {}", style(rev).dim()));
        }
        let _ = term.write_line(&line);
    }
}

/// Rewrites the single-dash `-sha1` of the legacy command line to `--sha1`;
/// clap would otherwise read it as `-s -h -a -1`.
fn legacy_args<I: IntoIterator<Item = OsString>>(args: I) -> Vec<OsString> {
    args.into_iter()
        .map(|arg| if arg == "-sha1" { OsString::from("--sha1") } else { arg })
        .collect()
}

fn replay<W: Write>(
    kind: CounterKind,
    runner: SystemRunner,
    root: &Path,
    options: RunOptions,
    out: W,
) -> Result<RunSummary> {
    let counter: Box<dyn LineCounter> = match kind {
        CounterKind::Simple => Box::new(SimpleCounter::new(root)),
        CounterKind::Pygount => Box::new(PygountCounter::new(runner.clone())),
    };
    Driver::new(runner, counter, options)
        .run(out)
        .context("Failed to replay repository history")
}
