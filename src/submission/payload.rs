//! Canonical submission forms.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::errors::{CatalogError, CatalogResult};

/// Which collection a submission addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordKind {
    Series,
    Chapter,
    Announcement,
}

impl RecordKind {
    pub fn parse(raw: &str) -> CatalogResult<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "series" => Ok(Self::Series),
            "chapter" => Ok(Self::Chapter),
            "announcement" | "announcements" => Ok(Self::Announcement),
            other => Err(CatalogError::invalid(
                "type",
                format!("must be series, chapter or announcement (got '{}')", other),
            )),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Series => "series",
            Self::Chapter => "chapter",
            Self::Announcement => "announcement",
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How the merged document reaches the tracked branch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CommitMode {
    /// Commit straight onto the tracked branch
    Direct,
    /// Commit on a new branch and open a review request
    #[default]
    ReviewBranch,
}

impl CommitMode {
    pub fn parse(raw: &str) -> CatalogResult<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "direct" => Ok(Self::Direct),
            "reviewbranch" | "review-branch" | "review_branch" | "review" | "pr" => {
                Ok(Self::ReviewBranch)
            }
            other => Err(CatalogError::invalid(
                "mode",
                format!("must be direct or reviewBranch (got '{}')", other),
            )),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Direct => "direct",
            Self::ReviewBranch => "reviewBranch",
        }
    }
}

/// Normalizer output. Fields are still unchecked; the validator turns
/// this into a [`Submission`].
#[derive(Debug, Clone, PartialEq)]
pub struct SubmissionPayload {
    pub kind: RecordKind,
    pub slug: Option<String>,
    pub series_slug: Option<String>,
    pub chapter_slug: Option<String>,
    pub data: Option<Value>,
    pub mode: CommitMode,
    /// Records bundled alongside a legacy series shape, applied after it
    pub companions: Vec<SubmissionPayload>,
}

impl SubmissionPayload {
    pub fn new(kind: RecordKind) -> Self {
        Self {
            kind,
            slug: None,
            series_slug: None,
            chapter_slug: None,
            data: None,
            mode: CommitMode::default(),
            companions: Vec::new(),
        }
    }
}

/// A submission that passed validation.
#[derive(Debug, Clone, PartialEq)]
pub enum Submission {
    Series {
        slug: String,
        record: Map<String, Value>,
    },
    Chapter {
        series_slug: String,
        chapter_slug: String,
        data: Map<String, Value>,
    },
    Announcement {
        entries: Vec<Value>,
    },
}

impl Submission {
    pub fn kind(&self) -> RecordKind {
        match self {
            Self::Series { .. } => RecordKind::Series,
            Self::Chapter { .. } => RecordKind::Chapter,
            Self::Announcement { .. } => RecordKind::Announcement,
        }
    }

    /// Key used in commit messages and branch names.
    pub fn subject(&self) -> &str {
        match self {
            Self::Series { slug, .. } => slug,
            Self::Chapter { chapter_slug, .. } => chapter_slug,
            Self::Announcement { .. } => "announcements",
        }
    }
}

/// The primary submission, its companions and the commit mode.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedSubmission {
    pub primary: Submission,
    pub companions: Vec<Submission>,
    pub mode: CommitMode,
}

impl ValidatedSubmission {
    /// Primary first, then companions in submission order.
    pub fn all(&self) -> impl Iterator<Item = &Submission> {
        std::iter::once(&self.primary).chain(self.companions.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_defaults_to_review_branch() {
        assert_eq!(CommitMode::default(), CommitMode::ReviewBranch);
    }

    #[test]
    fn test_mode_spellings() {
        assert_eq!(CommitMode::parse("direct").unwrap(), CommitMode::Direct);
        assert_eq!(CommitMode::parse("reviewBranch").unwrap(), CommitMode::ReviewBranch);
        assert_eq!(CommitMode::parse("pr").unwrap(), CommitMode::ReviewBranch);
        assert!(CommitMode::parse("yolo").is_err());
    }

    #[test]
    fn test_kind_parse_rejects_unknown() {
        let err = RecordKind::parse("comment").unwrap_err();
        assert!(matches!(err, CatalogError::Validation { ref field, .. } if field == "type"));
    }
}
