//! In-memory content store.
//!
//! Behaves like the hosted service for everything the catalog relies on:
//! per-branch files, content-hash revisions, CAS rejection, branch
//! creation from a tip and review requests. Fault injection hooks let
//! tests fail a specific step.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;

use super::{ContentStore, FetchOutcome, PutReceipt, PutRequest, ReviewRequest};
use crate::errors::{CatalogError, CatalogResult, CommitStep};
use crate::model::{Revision, VersionToken};

#[derive(Debug, Clone, Default)]
struct Branch {
    tip: String,
    files: HashMap<String, Vec<u8>>,
}

/// A review request recorded by the memory store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredReview {
    pub number: u64,
    pub head: String,
    pub base: String,
    pub title: String,
}

#[derive(Debug, Default)]
struct State {
    branches: HashMap<String, Branch>,
    reviews: Vec<StoredReview>,
    commits: u64,
    failing: Vec<CommitStep>,
}

/// In-memory [`ContentStore`]
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<State>,
    fetches: AtomicUsize,
    writes: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store seeded with one file on one branch.
    pub fn with_file(branch: &str, path: &str, content: impl Into<Vec<u8>>) -> Self {
        let store = Self::new();
        store.seed(branch, path, content);
        store
    }

    /// Write a file outside the CAS path, as another writer would.
    pub fn seed(&self, branch: &str, path: &str, content: impl Into<Vec<u8>>) {
        let mut state = self.lock();
        state.commits += 1;
        let tip = format!("c{}", state.commits);
        let entry = state.branches.entry(branch.to_string()).or_default();
        entry.tip = tip;
        entry.files.insert(path.to_string(), content.into());
    }

    /// Current content of a file, if any.
    pub fn file(&self, branch: &str, path: &str) -> Option<Vec<u8>> {
        self.lock()
            .branches
            .get(branch)
            .and_then(|b| b.files.get(path).cloned())
    }

    pub fn branch_names(&self) -> Vec<String> {
        let mut names: Vec<_> = self.lock().branches.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn reviews(&self) -> Vec<StoredReview> {
        self.lock().reviews.clone()
    }

    /// Number of fetches that reached the store, including not-modified ones.
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    /// Number of accepted writes.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Make every future call of `step` fail with an upstream error.
    pub fn fail_on(&self, step: CommitStep) {
        self.lock().failing.push(step);
    }

    /// Undo all [`fail_on`](Self::fail_on) injections.
    pub fn heal(&self) {
        self.lock().failing.clear();
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn injected(state: &State, step: CommitStep) -> CatalogResult<()> {
        if state.failing.contains(&step) {
            return Err(CatalogError::upstream(step, Some(503), "injected failure"));
        }
        Ok(())
    }
}

#[async_trait]
impl ContentStore for MemoryStore {
    async fn fetch(
        &self,
        branch: &str,
        path: &str,
        known: Option<&Revision>,
    ) -> CatalogResult<FetchOutcome> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        let state = self.lock();
        Self::injected(&state, CommitStep::FetchDocument)?;

        let bytes = state
            .branches
            .get(branch)
            .and_then(|b| b.files.get(path))
            .ok_or_else(|| {
                CatalogError::upstream(
                    CommitStep::FetchDocument,
                    Some(404),
                    format!("{} not found on {}", path, branch),
                )
            })?;

        let version = VersionToken::from_content(bytes);
        if known.is_some_and(|k| k.version == version) {
            return Ok(FetchOutcome::NotModified);
        }

        let etag = Some(format!("\"{}\"", version));
        Ok(FetchOutcome::Fetched {
            bytes: bytes.clone(),
            revision: Revision::new(version).with_etag(etag),
        })
    }

    async fn put(&self, request: PutRequest) -> CatalogResult<PutReceipt> {
        let mut state = self.lock();
        Self::injected(&state, CommitStep::WriteDocument)?;

        let current = state
            .branches
            .get(&request.branch)
            .ok_or_else(|| {
                CatalogError::upstream(
                    CommitStep::WriteDocument,
                    Some(404),
                    format!("branch {} not found", request.branch),
                )
            })?
            .files
            .get(&request.path)
            .map(|bytes| VersionToken::from_content(bytes));

        if current.as_ref() != Some(&request.expected) {
            return Err(CatalogError::Conflict {
                step: CommitStep::WriteDocument,
            });
        }

        state.commits += 1;
        let tip = format!("c{}", state.commits);
        let version = VersionToken::from_content(&request.content);
        if let Some(branch) = state.branches.get_mut(&request.branch) {
            branch.tip = tip.clone();
            branch.files.insert(request.path, request.content);
        }
        self.writes.fetch_add(1, Ordering::SeqCst);

        Ok(PutReceipt {
            commit: Some(tip),
            version,
        })
    }

    async fn branch_tip(&self, branch: &str) -> CatalogResult<String> {
        let state = self.lock();
        Self::injected(&state, CommitStep::ResolveTip)?;
        state
            .branches
            .get(branch)
            .map(|b| b.tip.clone())
            .ok_or_else(|| {
                CatalogError::upstream(
                    CommitStep::ResolveTip,
                    Some(404),
                    format!("branch {} not found", branch),
                )
            })
    }

    async fn create_branch(&self, name: &str, from: &str) -> CatalogResult<()> {
        let mut state = self.lock();
        Self::injected(&state, CommitStep::CreateBranch)?;

        if state.branches.contains_key(name) {
            return Err(CatalogError::upstream(
                CommitStep::CreateBranch,
                Some(422),
                format!("reference {} already exists", name),
            ));
        }
        let source = state
            .branches
            .values()
            .find(|b| b.tip == from)
            .cloned()
            .ok_or_else(|| {
                CatalogError::upstream(
                    CommitStep::CreateBranch,
                    Some(422),
                    format!("commit {} not found", from),
                )
            })?;
        state.branches.insert(name.to_string(), source);
        Ok(())
    }

    async fn open_review(
        &self,
        head: &str,
        base: &str,
        title: &str,
        _body: &str,
    ) -> CatalogResult<ReviewRequest> {
        let mut state = self.lock();
        Self::injected(&state, CommitStep::OpenReview)?;

        let number = state.reviews.len() as u64 + 1;
        state.reviews.push(StoredReview {
            number,
            head: head.to_string(),
            base: base.to_string(),
            title: title.to_string(),
        });
        Ok(ReviewRequest { number, url: None })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn put(expected: VersionToken, content: &[u8]) -> PutRequest {
        PutRequest {
            branch: "main".into(),
            path: "data.json".into(),
            content: content.to_vec(),
            message: "test".into(),
            expected,
            committer: None,
        }
    }

    #[tokio::test]
    async fn test_fetch_then_not_modified() {
        let store = MemoryStore::with_file("main", "data.json", b"{}".to_vec());
        let revision = match store.fetch("main", "data.json", None).await.unwrap() {
            FetchOutcome::Fetched { revision, .. } => revision,
            FetchOutcome::NotModified => panic!("first fetch must return content"),
        };
        let again = store.fetch("main", "data.json", Some(&revision)).await.unwrap();
        assert!(matches!(again, FetchOutcome::NotModified));
        assert_eq!(store.fetch_count(), 2);
    }

    #[tokio::test]
    async fn test_put_with_stale_token_conflicts() {
        let store = MemoryStore::with_file("main", "data.json", b"{}".to_vec());
        let token = VersionToken::from_content(b"{}");

        store.put(put(token.clone(), b"{\"a\":1}")).await.unwrap();
        let err = store.put(put(token, b"{\"a\":2}")).await.unwrap_err();
        assert!(err.is_conflict());
        assert_eq!(store.file("main", "data.json").unwrap(), b"{\"a\":1}".to_vec());
    }

    #[tokio::test]
    async fn test_branch_copies_files_at_tip() {
        let store = MemoryStore::with_file("main", "data.json", b"{}".to_vec());
        let tip = store.branch_tip("main").await.unwrap();
        store.create_branch("feature", &tip).await.unwrap();
        assert_eq!(store.file("feature", "data.json").unwrap(), b"{}".to_vec());
        assert!(store.create_branch("feature", &tip).await.is_err());
    }

    #[tokio::test]
    async fn test_injected_failure() {
        let store = MemoryStore::with_file("main", "data.json", b"{}".to_vec());
        store.fail_on(CommitStep::FetchDocument);
        assert!(store.fetch("main", "data.json", None).await.is_err());
        store.heal();
        assert!(store.fetch("main", "data.json", None).await.is_ok());
    }
}
