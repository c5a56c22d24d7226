//! Read cache
//!
//! Holds the most recently fetched document, its revision and the instant
//! it was fetched. Reads within the TTL never touch the store; later reads
//! revalidate with the cached revision as precondition.
//!
//! - Entries are immutable and replaced wholesale (one `Arc` swap under the
//!   write lock), so readers never see a half-updated entry
//! - Locks are never held across an await
//! - Concurrent misses may each fetch; the last new document to arrive
//!   wins, and a "not modified" answer never displaces a newer generation
//!
//! On fetch or decode failure the cache degrades to the last cached
//! document, then to a local snapshot file, before giving up.

use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use super::clock::{Clock, SystemClock};
use crate::errors::{CatalogError, CatalogResult, CommitStep};
use crate::model::{Document, Revision};
use crate::store::{ContentStore, FetchOutcome};

/// Default freshness window
pub const DEFAULT_TTL: Duration = Duration::from_secs(10);

/// Where the cache reads from and how long entries stay fresh.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    pub branch: String,
    pub path: String,
    pub ttl: Duration,
    /// Last-resort local copy of the document
    pub snapshot: Option<PathBuf>,
}

impl CacheConfig {
    pub fn new(branch: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            branch: branch.into(),
            path: path.into(),
            ttl: DEFAULT_TTL,
            snapshot: None,
        }
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn with_snapshot(mut self, snapshot: Option<PathBuf>) -> Self {
        self.snapshot = snapshot;
        self
    }
}

/// One immutable cache generation.
#[derive(Debug)]
pub struct CacheEntry {
    pub revision: Revision,
    pub document: Arc<Document>,
    pub cached_at: Instant,
}

/// Cache statistics. Passive only; never consulted by the cache itself.
#[derive(Debug, Default)]
pub struct CacheStats {
    hits: AtomicU64,
    revalidated: AtomicU64,
    refreshed: AtomicU64,
    degraded: AtomicU64,
}

/// Point-in-time copy of [`CacheStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct CacheStatsSnapshot {
    /// Served from a fresh entry
    pub hits: u64,
    /// Store answered "not modified"
    pub revalidated: u64,
    /// New content fetched and decoded
    pub refreshed: u64,
    /// Served from the stale entry or the local snapshot after a failure
    pub degraded: u64,
}

impl CacheStats {
    pub fn snapshot(&self) -> CacheStatsSnapshot {
        CacheStatsSnapshot {
            hits: self.hits.load(Ordering::Relaxed),
            revalidated: self.revalidated.load(Ordering::Relaxed),
            refreshed: self.refreshed.load(Ordering::Relaxed),
            degraded: self.degraded.load(Ordering::Relaxed),
        }
    }
}

/// Process-wide document cache
pub struct DocumentCache<C: Clock = SystemClock> {
    store: Arc<dyn ContentStore>,
    clock: C,
    config: CacheConfig,
    entry: RwLock<Option<Arc<CacheEntry>>>,
    stats: CacheStats,
}

impl DocumentCache<SystemClock> {
    pub fn new(store: Arc<dyn ContentStore>, config: CacheConfig) -> Self {
        Self::with_clock(store, config, SystemClock)
    }
}

impl<C: Clock> DocumentCache<C> {
    pub fn with_clock(store: Arc<dyn ContentStore>, config: CacheConfig, clock: C) -> Self {
        Self {
            store,
            clock,
            config,
            entry: RwLock::new(None),
            stats: CacheStats::default(),
        }
    }

    /// Current entry without any I/O.
    pub fn peek(&self) -> Option<Arc<CacheEntry>> {
        self.entry
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn stats(&self) -> CacheStatsSnapshot {
        self.stats.snapshot()
    }

    pub fn ttl(&self) -> Duration {
        self.config.ttl
    }

    /// Current document snapshot.
    pub async fn get(&self) -> CatalogResult<Arc<Document>> {
        let current = self.peek();

        if let Some(entry) = &current {
            let age = self.clock.now().saturating_duration_since(entry.cached_at);
            if age < self.config.ttl {
                self.stats.hits.fetch_add(1, Ordering::Relaxed);
                return Ok(Arc::clone(&entry.document));
            }
        }

        let known = current.as_ref().map(|e| &e.revision);
        let outcome = self
            .store
            .fetch(&self.config.branch, &self.config.path, known)
            .await;

        match outcome {
            Ok(FetchOutcome::NotModified) => match &current {
                Some(entry) => {
                    debug!(version = %entry.revision.version, "document not modified");
                    self.stats.revalidated.fetch_add(1, Ordering::Relaxed);
                    Ok(self.restamp(entry))
                }
                None => {
                    let err = CatalogError::upstream(
                        CommitStep::FetchDocument,
                        Some(304),
                        "store answered not-modified without a cached document",
                    );
                    self.degrade(None, err).await
                }
            },
            Ok(FetchOutcome::Fetched { bytes, revision }) => match Document::from_slice(&bytes) {
                Ok(document) => {
                    info!(version = %revision.version, series = document.series.len(), "document refreshed");
                    self.stats.refreshed.fetch_add(1, Ordering::Relaxed);
                    let document = Arc::new(document);
                    self.replace(CacheEntry {
                        revision,
                        document: Arc::clone(&document),
                        cached_at: self.clock.now(),
                    });
                    Ok(document)
                }
                Err(err) => self.degrade(current, err).await,
            },
            Err(err) => self.degrade(current, err).await,
        }
    }

    /// Extends the freshness of `seen`. When another read stored a newer
    /// generation during the fetch, that generation is kept and returned.
    fn restamp(&self, seen: &Arc<CacheEntry>) -> Arc<Document> {
        let mut slot = self.entry.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(latest) = slot.as_ref() {
            if !Arc::ptr_eq(latest, seen) {
                return Arc::clone(&latest.document);
            }
        }
        *slot = Some(Arc::new(CacheEntry {
            revision: seen.revision.clone(),
            document: Arc::clone(&seen.document),
            cached_at: self.clock.now(),
        }));
        Arc::clone(&seen.document)
    }

    fn replace(&self, entry: CacheEntry) {
        let mut slot = self.entry.write().unwrap_or_else(PoisonError::into_inner);
        *slot = Some(Arc::new(entry));
    }

    async fn degrade(
        &self,
        current: Option<Arc<CacheEntry>>,
        err: CatalogError,
    ) -> CatalogResult<Arc<Document>> {
        if let Some(entry) = current {
            warn!(error = %err, "document fetch failed, serving cached copy");
            self.stats.degraded.fetch_add(1, Ordering::Relaxed);
            return Ok(Arc::clone(&entry.document));
        }

        let Some(path) = &self.config.snapshot else {
            return Err(err);
        };
        match tokio::fs::read(path).await {
            Ok(bytes) => {
                warn!(error = %err, snapshot = %path.display(), "document fetch failed, serving local snapshot");
                let document = Document::from_slice(&bytes)?;
                self.stats.degraded.fetch_add(1, Ordering::Relaxed);
                Ok(Arc::new(document))
            }
            Err(io) => {
                warn!(snapshot = %path.display(), error = %io, "local snapshot unavailable");
                Err(err)
            }
        }
    }
}
