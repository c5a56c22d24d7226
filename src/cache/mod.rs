//! Document fetcher and read cache
//!
//! - [`DocumentCache`] - TTL + revalidation cache for the read path
//! - [`fetch_fresh`] - uncached fetch used once per write transaction

mod clock;
mod read_cache;

pub use clock::{Clock, ManualClock, SystemClock};
pub use read_cache::{
    CacheConfig, CacheEntry, CacheStatsSnapshot, DocumentCache, DEFAULT_TTL,
};

use tracing::debug;

use crate::errors::{CatalogError, CatalogResult, CommitStep};
use crate::model::{Document, Revision};
use crate::store::{ContentStore, FetchOutcome};

/// Fetch the current document and its revision, bypassing the cache.
///
/// Write transactions call this exactly once so the version token they
/// commit against is as fresh as possible.
pub async fn fetch_fresh(
    store: &dyn ContentStore,
    branch: &str,
    path: &str,
) -> CatalogResult<(Document, Revision)> {
    match store.fetch(branch, path, None).await? {
        FetchOutcome::Fetched { bytes, revision } => {
            let document = Document::from_slice(&bytes)?;
            debug!(version = %revision.version, "fetched document for write");
            Ok((document, revision))
        }
        FetchOutcome::NotModified => Err(CatalogError::upstream(
            CommitStep::FetchDocument,
            Some(304),
            "unconditional fetch answered not-modified",
        )),
    }
}
