//! Revision identity of the stored document.

use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Opaque identifier of one stored revision.
///
/// Only ever compared for equality; never parsed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VersionToken(String);

impl VersionToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// SHA-256 of the raw bytes, used by stores without native revision ids.
    pub fn from_content(content: &[u8]) -> Self {
        let digest = Sha256::digest(content);
        Self(format!("{:x}", digest))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VersionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A version token plus the validator the store hands out for
/// conditional re-fetches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Revision {
    pub version: VersionToken,
    pub etag: Option<String>,
}

impl Revision {
    pub fn new(version: VersionToken) -> Self {
        Self {
            version,
            etag: None,
        }
    }

    pub fn with_etag(mut self, etag: Option<String>) -> Self {
        self.etag = etag;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_token_deterministic() {
        let a = VersionToken::from_content(b"{\"series\":[]}");
        let b = VersionToken::from_content(b"{\"series\":[]}");
        assert_eq!(a, b);
        assert_eq!(a.as_str().len(), 64);
    }

    #[test]
    fn test_different_content_different_token() {
        assert_ne!(
            VersionToken::from_content(b"a"),
            VersionToken::from_content(b"b")
        );
    }
}
