//! Compare-and-swap committer
//!
//! - [`Committer`] - no-op detection, direct and review-branch commits
//! - [`naming`] - review branch names and commit messages

mod committer;
pub mod naming;

pub use committer::{CommitOutcome, CommitRequest, Committer};
