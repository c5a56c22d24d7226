//! # Local Filesystem Store
//!
//! Serves the catalog document from a directory on disk. Revisions are
//! SHA-256 content hashes; a write re-hashes the file before replacing it.
//! There is a single line of history, so review branches are rejected.

use std::io::ErrorKind;
use std::path::PathBuf;

use async_trait::async_trait;
use tokio::fs;
use tokio::sync::Mutex;

use super::{ContentStore, FetchOutcome, PutReceipt, PutRequest, ReviewRequest};
use crate::errors::{CatalogError, CatalogResult, CommitStep};
use crate::model::{Revision, VersionToken};

/// Local filesystem [`ContentStore`]
#[derive(Debug)]
pub struct LocalFileStore {
    root: PathBuf,
    write_lock: Mutex<()>,
}

impl LocalFileStore {
    pub fn new(root: PathBuf) -> Self {
        Self {
            root,
            write_lock: Mutex::new(()),
        }
    }

    fn full_path(&self, path: &str) -> PathBuf {
        self.root.join(path)
    }

    async fn read(&self, path: &str, step: CommitStep) -> CatalogResult<Vec<u8>> {
        fs::read(self.full_path(path)).await.map_err(|e| {
            let status = (e.kind() == ErrorKind::NotFound).then_some(404);
            CatalogError::upstream(step, status, format!("{}: {}", path, e))
        })
    }
}

#[async_trait]
impl ContentStore for LocalFileStore {
    async fn fetch(
        &self,
        _branch: &str,
        path: &str,
        known: Option<&Revision>,
    ) -> CatalogResult<FetchOutcome> {
        let bytes = self.read(path, CommitStep::FetchDocument).await?;
        let version = VersionToken::from_content(&bytes);

        if known.is_some_and(|k| k.version == version) {
            return Ok(FetchOutcome::NotModified);
        }
        Ok(FetchOutcome::Fetched {
            bytes,
            revision: Revision::new(version),
        })
    }

    async fn put(&self, request: PutRequest) -> CatalogResult<PutReceipt> {
        let _guard = self.write_lock.lock().await;

        let current = self.read(&request.path, CommitStep::WriteDocument).await?;
        if VersionToken::from_content(&current) != request.expected {
            return Err(CatalogError::Conflict {
                step: CommitStep::WriteDocument,
            });
        }

        let target = self.full_path(&request.path);
        let staging = target.with_extension("json.tmp");
        let io_err =
            |e: std::io::Error| CatalogError::upstream(CommitStep::WriteDocument, None, e.to_string());

        fs::write(&staging, &request.content).await.map_err(io_err)?;
        fs::rename(&staging, &target).await.map_err(io_err)?;

        Ok(PutReceipt {
            commit: None,
            version: VersionToken::from_content(&request.content),
        })
    }

    async fn branch_tip(&self, _branch: &str) -> CatalogResult<String> {
        Err(CatalogError::upstream(
            CommitStep::ResolveTip,
            None,
            "review branches are not supported by the local store",
        ))
    }

    async fn create_branch(&self, _name: &str, _from: &str) -> CatalogResult<()> {
        Err(CatalogError::upstream(
            CommitStep::CreateBranch,
            None,
            "review branches are not supported by the local store",
        ))
    }

    async fn open_review(
        &self,
        _head: &str,
        _base: &str,
        _title: &str,
        _body: &str,
    ) -> CatalogResult<ReviewRequest> {
        Err(CatalogError::upstream(
            CommitStep::OpenReview,
            None,
            "review requests are not supported by the local store",
        ))
    }
}
