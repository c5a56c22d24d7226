//! Record validator
//!
//! Runs after normalization and before any store call:
//! - series: `slug` non-empty, `data` an object
//! - chapter: `seriesSlug` and `chapterSlug` non-empty, `data.pages` a
//!   non-empty array of page references
//! - announcement: `data` present
//!
//! The validator never touches the store, so a rejected submission has
//! no side effects.

use serde_json::{Map, Value};

use super::payload::{
    RecordKind, Submission, SubmissionPayload, ValidatedSubmission,
};
use crate::errors::{CatalogError, CatalogResult};

/// Validate a normalized payload and its companions.
pub fn validate(payload: &SubmissionPayload) -> CatalogResult<ValidatedSubmission> {
    let primary = validate_record(payload)?;
    let companions = payload
        .companions
        .iter()
        .map(validate_record)
        .collect::<CatalogResult<Vec<_>>>()?;

    Ok(ValidatedSubmission {
        primary,
        companions,
        mode: payload.mode,
    })
}

/// Validate a single payload, ignoring its companions.
pub fn validate_record(payload: &SubmissionPayload) -> CatalogResult<Submission> {
    match payload.kind {
        RecordKind::Series => {
            let slug = required_text(&payload.slug, "slug")?;
            let mut record = data_object(&payload.data)?;

            match record.get("slug") {
                Some(Value::String(inner)) if inner.trim() != slug => {
                    return Err(CatalogError::invalid(
                        "data.slug",
                        format!("'{}' does not match slug '{}'", inner, slug),
                    ));
                }
                _ => {}
            }
            record.insert("slug".into(), Value::String(slug.clone()));

            Ok(Submission::Series { slug, record })
        }
        RecordKind::Chapter => {
            let series_slug = required_text(&payload.series_slug, "seriesSlug")?;
            let chapter_slug = required_text(&payload.chapter_slug, "chapterSlug")?;
            let data = data_object(&payload.data)?;

            match data.get("pages") {
                Some(Value::Array(pages)) if !pages.is_empty() => {}
                Some(Value::Array(_)) => {
                    return Err(CatalogError::invalid("data.pages", "must not be empty"));
                }
                Some(_) => {
                    return Err(CatalogError::invalid("data.pages", "must be an array"));
                }
                None => return Err(CatalogError::missing("data.pages")),
            }

            Ok(Submission::Chapter {
                series_slug,
                chapter_slug,
                data,
            })
        }
        RecordKind::Announcement => match &payload.data {
            None | Some(Value::Null) => Err(CatalogError::missing("data")),
            Some(Value::Array(entries)) => Ok(Submission::Announcement {
                entries: entries.clone(),
            }),
            Some(entry) => Ok(Submission::Announcement {
                entries: vec![entry.clone()],
            }),
        },
    }
}

fn required_text(value: &Option<String>, field: &str) -> CatalogResult<String> {
    match value.as_deref().map(str::trim) {
        Some(s) if !s.is_empty() => Ok(s.to_string()),
        _ => Err(CatalogError::missing(field)),
    }
}

fn data_object(data: &Option<Value>) -> CatalogResult<Map<String, Value>> {
    match data {
        Some(Value::Object(map)) => Ok(map.clone()),
        None | Some(Value::Null) => Err(CatalogError::missing("data")),
        Some(_) => Err(CatalogError::invalid("data", "must be an object")),
    }
}
