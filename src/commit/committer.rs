//! Compare-and-swap committer
//!
//! Serializes the merged document, skips the write when it is
//! byte-identical to the original, and otherwise writes it guarded by the
//! version token observed at fetch time.
//!
//! Direct mode:
//!   put(tracked branch)
//!
//! Review-branch mode:
//!   branch_tip(tracked) -> create_branch -> put(new branch) -> open_review
//!
//! Nothing is retried or rolled back. Once the review branch exists, any
//! failure is reported as [`CatalogError::PartialCommit`] naming the branch.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};

use super::naming::{commit_message, review_branch_name};
use crate::errors::{CatalogError, CatalogResult, CommitStep};
use crate::model::{Document, VersionToken};
use crate::store::{CommitterIdentity, ContentStore, PutRequest, ReviewRequest};
use crate::submission::{CommitMode, RecordKind};

/// Everything the committer needs for one write.
#[derive(Debug, Clone, Copy)]
pub struct CommitRequest<'a> {
    pub original: &'a Document,
    pub merged: &'a Document,
    /// Token of the revision `original` was decoded from
    pub expected: &'a VersionToken,
    pub mode: CommitMode,
    pub kind: RecordKind,
    pub subject: &'a str,
}

/// Outcome of a commit attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum CommitOutcome {
    /// Merged document identical to the original; nothing written
    NoOp,
    Committed {
        commit: Option<String>,
        branch: String,
        review: Option<ReviewRequest>,
        version: VersionToken,
    },
}

impl CommitOutcome {
    pub fn is_noop(&self) -> bool {
        matches!(self, Self::NoOp)
    }
}

pub struct Committer {
    store: Arc<dyn ContentStore>,
    branch: String,
    path: String,
    identity: Option<CommitterIdentity>,
    now: fn() -> DateTime<Utc>,
}

impl Committer {
    pub fn new(store: Arc<dyn ContentStore>, branch: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            store,
            branch: branch.into(),
            path: path.into(),
            identity: None,
            now: Utc::now,
        }
    }

    pub fn with_identity(mut self, identity: Option<CommitterIdentity>) -> Self {
        self.identity = identity;
        self
    }

    /// Replace the timestamp source used for branch names.
    pub fn with_clock(mut self, now: fn() -> DateTime<Utc>) -> Self {
        self.now = now;
        self
    }

    pub fn branch(&self) -> &str {
        &self.branch
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub async fn commit(&self, request: CommitRequest<'_>) -> CatalogResult<CommitOutcome> {
        let content = request.merged.to_bytes()?;
        if content == request.original.to_bytes()? {
            info!(kind = %request.kind, subject = request.subject, "merged document unchanged, skipping write");
            return Ok(CommitOutcome::NoOp);
        }

        match request.mode {
            CommitMode::Direct => self.commit_direct(&request, content).await,
            CommitMode::ReviewBranch => self.commit_review(&request, content).await,
        }
    }

    fn put_request(&self, branch: &str, request: &CommitRequest<'_>, content: Vec<u8>) -> PutRequest {
        PutRequest {
            branch: branch.to_string(),
            path: self.path.clone(),
            content,
            message: commit_message(request.kind, request.subject),
            expected: request.expected.clone(),
            committer: self.identity.clone(),
        }
    }

    async fn commit_direct(
        &self,
        request: &CommitRequest<'_>,
        content: Vec<u8>,
    ) -> CatalogResult<CommitOutcome> {
        let receipt = self
            .store
            .put(self.put_request(&self.branch, request, content))
            .await?;

        info!(
            branch = %self.branch,
            commit = receipt.commit.as_deref().unwrap_or("-"),
            "document committed"
        );
        Ok(CommitOutcome::Committed {
            commit: receipt.commit,
            branch: self.branch.clone(),
            review: None,
            version: receipt.version,
        })
    }

    async fn commit_review(
        &self,
        request: &CommitRequest<'_>,
        content: Vec<u8>,
    ) -> CatalogResult<CommitOutcome> {
        let tip = self.store.branch_tip(&self.branch).await?;
        let head = review_branch_name(request.kind, request.subject, (self.now)());
        self.store.create_branch(&head, &tip).await?;
        info!(branch = %head, from = %tip, "review branch created");

        let partial = |step: CommitStep, cause: CatalogError| {
            warn!(branch = %head, %step, error = %cause, "review commit left a branch behind");
            CatalogError::PartialCommit {
                step,
                branch: head.clone(),
                cause: Box::new(cause),
            }
        };

        let receipt = self
            .store
            .put(self.put_request(&head, request, content))
            .await
            .map_err(|e| partial(CommitStep::WriteDocument, e))?;

        let title = commit_message(request.kind, request.subject);
        let body = format!(
            "Automated {} submission for `{}`.\n\nFile: `{}`",
            request.kind, request.subject, self.path
        );
        let review = self
            .store
            .open_review(&head, &self.branch, &title, &body)
            .await
            .map_err(|e| partial(CommitStep::OpenReview, e))?;

        info!(branch = %head, review = review.number, "review request opened");
        Ok(CommitOutcome::Committed {
            commit: receipt.commit,
            branch: head,
            review: Some(review),
            version: receipt.version,
        })
    }
}
