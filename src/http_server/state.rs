//! Shared handler state.

use std::sync::Arc;

use subtle::ConstantTimeEq;

use crate::cache::DocumentCache;
use crate::commit::Committer;
use crate::config::CatalogConfig;
use crate::errors::CatalogResult;
use crate::pipeline::SubmitPipeline;
use crate::store::ContentStore;

/// Read cache, write pipeline and the submit secret.
pub struct AppState {
    pub cache: DocumentCache,
    pub pipeline: SubmitPipeline,
    secret: Option<String>,
}

impl AppState {
    pub fn new(cache: DocumentCache, pipeline: SubmitPipeline, secret: Option<String>) -> Self {
        Self {
            cache,
            pipeline,
            secret: secret.filter(|s| !s.is_empty()),
        }
    }

    /// Wire the cache and pipeline over an existing store.
    pub fn from_store(store: Arc<dyn ContentStore>, config: &CatalogConfig) -> Self {
        let cache = DocumentCache::new(Arc::clone(&store), config.cache_config());
        let committer = Committer::new(Arc::clone(&store), config.branch.clone(), config.data_path())
            .with_identity(config.committer.clone());
        let pipeline = SubmitPipeline::new(store, committer);
        Self::new(cache, pipeline, config.submit_secret.clone())
    }

    pub fn from_config(config: &CatalogConfig) -> CatalogResult<Self> {
        Ok(Self::from_store(config.build_store()?, config))
    }

    /// Constant-time secret comparison. With no secret configured every
    /// submission is refused.
    pub fn accepts_secret(&self, given: Option<&str>) -> bool {
        match (&self.secret, given) {
            (Some(expected), Some(given)) => expected.as_bytes().ct_eq(given.as_bytes()).into(),
            _ => false,
        }
    }
}
