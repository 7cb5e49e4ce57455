//! Replays a git repository's history commit by commit and records how many
//! lines of code each revision holds.

pub mod cli;
pub mod count;
pub mod driver;
pub mod error;
pub mod git;
pub mod logging;
pub mod model;
pub mod process;
pub mod report;

#[cfg(test)]
pub(crate) mod test_support;

pub use driver::{Driver, FailurePolicy, RunOptions, RunSummary};
pub use error::{LocError, Result};
pub use model::CommitRecord;
