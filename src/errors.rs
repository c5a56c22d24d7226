//! # Catalog Errors
//!
//! One taxonomy shared by every component of the write and read paths.
//! Each variant maps to a stable code and an HTTP status.

use std::fmt;

use thiserror::Error;

/// Result type for catalog operations
pub type CatalogResult<T> = Result<T, CatalogError>;

/// The store interaction a failure happened in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitStep {
    FetchDocument,
    ResolveTip,
    CreateBranch,
    WriteDocument,
    OpenReview,
}

impl CommitStep {
    pub fn as_str(&self) -> &'static str {
        match self {
            CommitStep::FetchDocument => "fetch_document",
            CommitStep::ResolveTip => "resolve_tip",
            CommitStep::CreateBranch => "create_branch",
            CommitStep::WriteDocument => "write_document",
            CommitStep::OpenReview => "open_review",
        }
    }
}

impl fmt::Display for CommitStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Catalog errors
#[derive(Debug, Clone, Error)]
pub enum CatalogError {
    // ==================
    // Rejected before any network call
    // ==================
    /// Malformed or incomplete submission
    #[error("Invalid submission: {field} {reason}")]
    Validation { field: String, reason: String },

    /// Missing or incorrect shared secret
    #[error("Unauthorized")]
    Auth,

    // ==================
    // Merge errors
    // ==================
    /// Referenced parent entity absent
    #[error("Not found: {0}")]
    NotFound(String),

    // ==================
    // Store errors
    // ==================
    /// The stored revision no longer matches the supplied version token
    #[error("Conflict at {step}: document changed since it was fetched")]
    Conflict { step: CommitStep },

    /// Backing store unreachable or rejected the call
    #[error("Upstream error at {step}: {message}")]
    Upstream {
        step: CommitStep,
        status: Option<u16>,
        message: String,
    },

    /// Stored document could not be parsed
    #[error("Stored document could not be decoded: {0}")]
    Decode(String),

    /// A review-branch commit failed after the branch already exists
    #[error("Commit failed at {step} after creating branch '{branch}': {cause}")]
    PartialCommit {
        step: CommitStep,
        branch: String,
        cause: Box<CatalogError>,
    },

    // ==================
    // Setup
    // ==================
    #[error("Configuration error: {0}")]
    Config(String),
}

impl CatalogError {
    /// Create a validation error for a missing field
    pub fn missing(field: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            reason: "is required".into(),
        }
    }

    /// Create a validation error with a custom reason
    pub fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub fn upstream(step: CommitStep, status: Option<u16>, message: impl Into<String>) -> Self {
        Self::Upstream {
            step,
            status,
            message: message.into(),
        }
    }

    /// Get error code for API responses
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation { .. } => "VALIDATION_ERROR",
            Self::Auth => "AUTH_ERROR",
            Self::NotFound(_) => "NOT_FOUND",
            Self::Conflict { .. } => "CONFLICT",
            Self::Upstream { .. } => "UPSTREAM_ERROR",
            Self::Decode(_) => "DECODE_ERROR",
            Self::PartialCommit { cause, .. } => cause.code(),
            Self::Config(_) => "CONFIG_ERROR",
        }
    }

    /// Get HTTP status code
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Validation { .. } => 400,
            Self::Auth => 401,
            Self::NotFound(_) => 404,
            Self::Conflict { .. } => 409,
            Self::Upstream { .. } => 502,
            Self::Decode(_) => 500,
            Self::PartialCommit { cause, .. } => cause.status_code(),
            Self::Config(_) => 500,
        }
    }

    /// The store step that failed, if the error came from the store.
    pub fn step(&self) -> Option<CommitStep> {
        match self {
            Self::Conflict { step }
            | Self::Upstream { step, .. }
            | Self::PartialCommit { step, .. } => Some(*step),
            _ => None,
        }
    }

    /// Branch left behind by a failed review-branch commit.
    pub fn orphaned_branch(&self) -> Option<&str> {
        match self {
            Self::PartialCommit { branch, .. } => Some(branch),
            _ => None,
        }
    }

    pub fn is_conflict(&self) -> bool {
        match self {
            Self::Conflict { .. } => true,
            Self::PartialCommit { cause, .. } => cause.is_conflict(),
            _ => false,
        }
    }
}

impl From<serde_json::Error> for CatalogError {
    fn from(e: serde_json::Error) -> Self {
        Self::Decode(e.to_string())
    }
}
