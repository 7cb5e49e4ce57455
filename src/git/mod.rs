pub mod checkout;
pub mod history;
pub mod repo;

pub use checkout::{CheckoutController, CheckoutOutcome, CleanReport, CleanStep, StepOutcome, TreeState};
pub use history::{parse_log, parse_log_line, HistoryWalker};
pub use repo::GitRepo;
