//! Service configuration
//!
//! Loaded from a JSON file, then overridden by the deployment environment:
//!
//! | Variable              | Field           |
//! |-----------------------|-----------------|
//! | `GH_REPO`             | `repository`    |
//! | `GH_BRANCH`           | `branch`        |
//! | `GITHUB_TOKEN`        | `access_token`  |
//! | `SUBMIT_SECRET`       | `submit_secret` |
//! | `CATALOG_PATH_PREFIX` | `path_prefix`   |
//!
//! Without a repository the service runs in local mode against a file
//! under `local_root`.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::cache::CacheConfig;
use crate::errors::{CatalogError, CatalogResult};
use crate::http_server::HttpServerConfig;
use crate::store::{
    CommitterIdentity, ContentStore, GitHubStore, LocalFileStore, RepoCoordinates,
};

/// Configuration file structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// `owner/repo`; absent means local mode
    #[serde(default)]
    pub repository: Option<String>,

    /// Tracked branch (default: "main")
    #[serde(default = "default_branch")]
    pub branch: String,

    /// Directory inside the repository holding the data file
    #[serde(default)]
    pub path_prefix: String,

    /// Data file name (default: "data.json")
    #[serde(default = "default_data_file")]
    pub data_file: String,

    /// Shared secret expected in `x-submit-secret`
    #[serde(default)]
    pub submit_secret: Option<String>,

    /// Token for the hosting service API
    #[serde(default)]
    pub access_token: Option<String>,

    /// Author attribution for commits
    #[serde(default)]
    pub committer: Option<CommitterIdentity>,

    /// Local copy served when the store is unreachable and nothing is cached
    #[serde(default)]
    pub snapshot_path: Option<PathBuf>,

    /// Directory the local store reads from (default: ".")
    #[serde(default = "default_local_root")]
    pub local_root: PathBuf,

    /// Read cache freshness window in seconds (default: 10)
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,

    /// Hosting service API root (default: "https://api.github.com")
    #[serde(default = "default_api_base")]
    pub api_base: String,

    #[serde(default)]
    pub http: HttpServerConfig,
}

fn default_branch() -> String {
    "main".to_string()
}
fn default_data_file() -> String {
    "data.json".to_string()
}
fn default_local_root() -> PathBuf {
    PathBuf::from(".")
}
fn default_cache_ttl_secs() -> u64 {
    10
}
fn default_api_base() -> String {
    "https://api.github.com".to_string()
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            repository: None,
            branch: default_branch(),
            path_prefix: String::new(),
            data_file: default_data_file(),
            submit_secret: None,
            access_token: None,
            committer: None,
            snapshot_path: None,
            local_root: default_local_root(),
            cache_ttl_secs: default_cache_ttl_secs(),
            api_base: default_api_base(),
            http: HttpServerConfig::default(),
        }
    }
}

impl CatalogConfig {
    /// Load configuration from file and the process environment
    pub fn load(path: &Path) -> CatalogResult<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| CatalogError::Config(format!("Failed to read config: {}", e)))?;

        let mut config: CatalogConfig = serde_json::from_str(&content)
            .map_err(|e| CatalogError::Config(format!("Invalid config JSON: {}", e)))?;

        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;

        Ok(config)
    }

    /// Apply environment overrides; empty values are ignored.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(repo) = get("GH_REPO") {
            self.repository = Some(repo);
        }
        if let Some(branch) = get("GH_BRANCH") {
            self.branch = branch;
        }
        if let Some(token) = get("GITHUB_TOKEN") {
            self.access_token = Some(token);
        }
        if let Some(secret) = get("SUBMIT_SECRET") {
            self.submit_secret = Some(secret);
        }
        if let Some(prefix) = get("CATALOG_PATH_PREFIX") {
            self.path_prefix = prefix;
        }
    }

    pub fn validate(&self) -> CatalogResult<()> {
        if let Some(repo) = &self.repository {
            RepoCoordinates::parse(repo)?;
        }

        if self.branch.trim().is_empty() {
            return Err(CatalogError::Config("branch must not be empty".into()));
        }

        if self.data_file.trim().is_empty() {
            return Err(CatalogError::Config("data_file must not be empty".into()));
        }

        if self.cache_ttl_secs == 0 {
            return Err(CatalogError::Config("cache_ttl_secs must be > 0".into()));
        }

        Ok(())
    }

    /// Repository path of the data file.
    pub fn data_path(&self) -> String {
        let prefix = self.path_prefix.trim_matches('/');
        let file = self.data_file.trim_matches('/');
        if prefix.is_empty() {
            file.to_string()
        } else {
            format!("{}/{}", prefix, file)
        }
    }

    pub fn is_local(&self) -> bool {
        self.repository.is_none()
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    pub fn cache_config(&self) -> CacheConfig {
        CacheConfig::new(self.branch.clone(), self.data_path())
            .with_ttl(self.cache_ttl())
            .with_snapshot(self.snapshot_path.clone())
    }

    /// The secret, if one is configured and non-empty.
    pub fn secret(&self) -> Option<&str> {
        self.submit_secret.as_deref().filter(|s| !s.is_empty())
    }

    /// Store selected by the configuration.
    pub fn build_store(&self) -> CatalogResult<Arc<dyn ContentStore>> {
        match &self.repository {
            Some(repo) => {
                let coordinates = RepoCoordinates::parse(repo)?;
                let store =
                    GitHubStore::new(self.api_base.clone(), coordinates, self.access_token.clone())?;
                Ok(Arc::new(store))
            }
            None => Ok(Arc::new(LocalFileStore::new(self.local_root.clone()))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn write_config(temp_dir: &TempDir, value: serde_json::Value) -> PathBuf {
        let path = temp_dir.path().join("catalogd.json");
        fs::write(&path, value.to_string()).unwrap();
        path
    }

    #[test]
    fn test_config_defaults() {
        let config: CatalogConfig = serde_json::from_value(json!({})).unwrap();
        assert_eq!(config.branch, "main");
        assert_eq!(config.data_file, "data.json");
        assert_eq!(config.cache_ttl_secs, 10);
        assert_eq!(config.api_base, "https://api.github.com");
        assert!(config.is_local());
        assert_eq!(config.data_path(), "data.json");
    }

    #[test]
    fn test_data_path_with_prefix() {
        let config = CatalogConfig {
            path_prefix: "/catalog/".into(),
            ..CatalogConfig::default()
        };
        assert_eq!(config.data_path(), "catalog/data.json");
    }

    #[test]
    fn test_environment_overrides() {
        let env: HashMap<&str, &str> = [
            ("GH_REPO", "owner/repo"),
            ("GH_BRANCH", "prod"),
            ("SUBMIT_SECRET", "s3cret"),
            ("GITHUB_TOKEN", ""),
        ]
        .into_iter()
        .collect();

        let mut config = CatalogConfig::default();
        config.apply_overrides(|k| env.get(k).map(|v| v.to_string()));

        assert_eq!(config.repository.as_deref(), Some("owner/repo"));
        assert_eq!(config.branch, "prod");
        assert_eq!(config.secret(), Some("s3cret"));
        assert!(config.access_token.is_none());
    }

    #[test]
    fn test_load_rejects_bad_repository() {
        let temp_dir = TempDir::new().unwrap();
        let path = write_config(&temp_dir, json!({"repository": "not-a-repo"}));
        // GH_REPO in the environment would mask the file value
        if std::env::var("GH_REPO").is_ok() {
            return;
        }
        assert_eq!(CatalogConfig::load(&path).unwrap_err().code(), "CONFIG_ERROR");
    }

    #[test]
    fn test_load_rejects_zero_ttl() {
        let temp_dir = TempDir::new().unwrap();
        let path = write_config(&temp_dir, json!({"cache_ttl_secs": 0}));
        assert!(CatalogConfig::load(&path).is_err());
    }

    #[test]
    fn test_load_rejects_invalid_json() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("catalogd.json");
        fs::write(&path, "{ nope").unwrap();
        assert!(CatalogConfig::load(&path).is_err());
    }

    #[test]
    fn test_local_mode_builds_store() {
        let config = CatalogConfig::default();
        assert!(config.build_store().is_ok());
    }
}
