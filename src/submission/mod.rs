//! Submission intake
//!
//! Raw request bodies exist only inside this module. Everything
//! downstream consumes [`ValidatedSubmission`].
//!
//! normalize -> validate -> (merge, commit)

mod normalizer;
mod payload;
mod validator;

pub use normalizer::normalize;
pub use payload::{
    CommitMode, RecordKind, Submission, SubmissionPayload, ValidatedSubmission,
};
pub use validator::{validate, validate_record};

use serde_json::Value;

use crate::errors::CatalogResult;

/// Normalize and validate in one step.
pub fn intake(body: &Value) -> CatalogResult<ValidatedSubmission> {
    validate(&normalize(body)?)
}
