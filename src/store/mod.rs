//! # Content Store
//!
//! The version-controlled hosting service seen through its content API.
//! Every call is a suspension point and returns a [`CatalogResult`].
//!
//! Implementations:
//! - [`GitHubStore`] - GitHub contents/refs/pulls API
//! - [`MemoryStore`] - in-process, for tests and embedding
//! - [`LocalFileStore`] - one JSON file on disk, for local development

mod github;
mod local;
mod memory;

pub use github::{GitHubStore, RepoCoordinates};
pub use local::LocalFileStore;
pub use memory::{MemoryStore, StoredReview};

use async_trait::async_trait;
use serde::Serialize;

use crate::errors::CatalogResult;
use crate::model::{Revision, VersionToken};

/// Result of a (possibly conditional) document fetch.
#[derive(Debug, Clone)]
pub enum FetchOutcome {
    /// The revision supplied as precondition is still current
    NotModified,
    /// Raw document bytes and the revision they belong to
    Fetched { bytes: Vec<u8>, revision: Revision },
}

/// Author attribution for commits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, serde::Deserialize)]
pub struct CommitterIdentity {
    pub name: String,
    pub email: String,
}

/// A compare-and-swap write of the document file.
#[derive(Debug, Clone)]
pub struct PutRequest {
    pub branch: String,
    pub path: String,
    pub content: Vec<u8>,
    pub message: String,
    /// Revision the content was derived from; the write is rejected with
    /// a conflict when the stored revision differs
    pub expected: VersionToken,
    pub committer: Option<CommitterIdentity>,
}

/// Receipt of an accepted write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PutReceipt {
    pub commit: Option<String>,
    pub version: VersionToken,
}

/// An opened review request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReviewRequest {
    pub number: u64,
    pub url: Option<String>,
}

#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Fetch the file at `path` on `branch`. When `known` is given and
    /// still current, the store may answer [`FetchOutcome::NotModified`].
    async fn fetch(
        &self,
        branch: &str,
        path: &str,
        known: Option<&Revision>,
    ) -> CatalogResult<FetchOutcome>;

    /// Write the file, guarded by `request.expected`.
    async fn put(&self, request: PutRequest) -> CatalogResult<PutReceipt>;

    /// Commit id at the tip of `branch`.
    async fn branch_tip(&self, branch: &str) -> CatalogResult<String>;

    /// Create `name` pointing at commit `from`.
    async fn create_branch(&self, name: &str, from: &str) -> CatalogResult<()>;

    /// Open a review request merging `head` into `base`.
    async fn open_review(
        &self,
        head: &str,
        base: &str,
        title: &str,
        body: &str,
    ) -> CatalogResult<ReviewRequest>;
}
