//! # Submit Pipeline
//!
//! One write transaction:
//!
//! ```text
//! raw body -> normalize -> validate -> fetch (fresh) -> merge -> commit
//! ```
//!
//! Validation failures return before the store is contacted. Each call
//! fetches its own document; nothing is shared between transactions and
//! there is no in-process writer lock. A conflict means the whole cycle
//! must be re-run by the caller.

use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::cache::fetch_fresh;
use crate::commit::{CommitOutcome, CommitRequest, Committer};
use crate::errors::CatalogResult;
use crate::merge::merge_all;
use crate::store::{ContentStore, ReviewRequest};
use crate::submission::{intake, CommitMode};

/// Success response of a write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubmitReceipt {
    pub ok: bool,
    pub mode: CommitMode,
    pub path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub commit: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub review: Option<ReviewRequest>,
    pub noop: bool,
}

pub struct SubmitPipeline {
    store: Arc<dyn ContentStore>,
    committer: Committer,
}

impl SubmitPipeline {
    pub fn new(store: Arc<dyn ContentStore>, committer: Committer) -> Self {
        Self { store, committer }
    }

    pub fn committer(&self) -> &Committer {
        &self.committer
    }

    /// Run one submission end to end.
    pub async fn submit(&self, body: &Value) -> CatalogResult<SubmitReceipt> {
        let submission = intake(body)?;
        let primary = &submission.primary;
        debug!(
            kind = %primary.kind(),
            subject = primary.subject(),
            companions = submission.companions.len(),
            mode = submission.mode.as_str(),
            "submission accepted"
        );

        let (original, revision) =
            fetch_fresh(self.store.as_ref(), self.committer.branch(), self.committer.path()).await?;
        let merged = merge_all(&original, &submission)?;
        for effect in &merged.effects {
            debug!(?effect, "merge effect");
        }

        let outcome = self
            .committer
            .commit(CommitRequest {
                original: &original,
                merged: &merged.document,
                expected: &revision.version,
                mode: submission.mode,
                kind: primary.kind(),
                subject: primary.subject(),
            })
            .await
            .inspect_err(|e| warn!(error = %e, code = e.code(), "submission failed"))?;

        let receipt = match outcome {
            CommitOutcome::NoOp => SubmitReceipt {
                ok: true,
                mode: submission.mode,
                path: self.committer.path().to_string(),
                commit: None,
                branch: None,
                review: None,
                noop: true,
            },
            CommitOutcome::Committed {
                commit,
                branch,
                review,
                ..
            } => SubmitReceipt {
                ok: true,
                mode: submission.mode,
                path: self.committer.path().to_string(),
                commit,
                branch: Some(branch),
                review,
                noop: false,
            },
        };

        info!(
            kind = %primary.kind(),
            subject = primary.subject(),
            noop = receipt.noop,
            "submission processed"
        );
        Ok(receipt)
    }
}
