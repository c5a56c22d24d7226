//! Payload normalizer
//!
//! Maps every submission shape the service has ever accepted onto one
//! [`SubmissionPayload`]. Shape precedence:
//!
//! 1. explicit `type` field
//! 2. legacy series shape (`series` object, optionally bundling
//!    `chapters` and `announcements`)
//! 3. legacy chapter shape (`chapter` object)
//!
//! A body wrapped as `{"payload": {...}}` is unwrapped first. The input is
//! only read, never modified.

use serde_json::{Map, Value};

use super::payload::{CommitMode, RecordKind, SubmissionPayload};
use crate::errors::{CatalogError, CatalogResult};

/// Normalize a decoded request body.
pub fn normalize(body: &Value) -> CatalogResult<SubmissionPayload> {
    let outer = body
        .as_object()
        .ok_or_else(|| CatalogError::invalid("body", "must be a JSON object"))?;

    let root = match outer.get("payload") {
        Some(Value::Object(inner)) => inner,
        _ => outer,
    };

    let mode = match mode_field(root)? {
        Some(mode) => mode,
        None => mode_field(outer)?.unwrap_or_default(),
    };

    let mut payload = if let Some(kind) = root.get("type").filter(|v| !v.is_null()) {
        explicit_shape(root, kind)?
    } else if let Some(Value::Object(series)) = root.get("series") {
        legacy_series_shape(root, series)
    } else if let Some(Value::Object(chapter)) = root.get("chapter") {
        legacy_chapter_shape(root, chapter)
    } else {
        return Err(CatalogError::invalid(
            "type",
            "is required (no recognized submission shape)",
        ));
    };

    payload.mode = mode;
    for companion in &mut payload.companions {
        companion.mode = mode;
    }
    Ok(payload)
}

fn mode_field(obj: &Map<String, Value>) -> CatalogResult<Option<CommitMode>> {
    match obj.get("mode") {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(raw)) => CommitMode::parse(raw).map(Some),
        Some(_) => Err(CatalogError::invalid("mode", "must be a string")),
    }
}

fn explicit_shape(root: &Map<String, Value>, kind: &Value) -> CatalogResult<SubmissionPayload> {
    let kind = kind
        .as_str()
        .ok_or_else(|| CatalogError::invalid("type", "must be a string"))?;
    let mut payload = SubmissionPayload::new(RecordKind::parse(kind)?);

    payload.data = root.get("data").filter(|v| !v.is_null()).cloned();
    payload.slug = text(root, &["slug"]).or_else(|| {
        payload
            .data
            .as_ref()
            .and_then(Value::as_object)
            .and_then(|d| text(d, &["slug"]))
    });
    payload.series_slug = text(root, &["seriesSlug", "series_slug"]);
    payload.chapter_slug = text(root, &["chapterSlug", "chapter_slug"]);
    Ok(payload)
}

fn legacy_series_shape(root: &Map<String, Value>, series: &Map<String, Value>) -> SubmissionPayload {
    let mut payload = SubmissionPayload::new(RecordKind::Series);
    payload.slug = text(series, &["slug"]);
    payload.data = Some(Value::Object(series.clone()));

    if let Some(Value::Object(bundled)) = root.get("chapters") {
        for (series_slug, records) in bundled {
            let Value::Array(records) = records else {
                continue;
            };
            for record in records {
                let mut companion = SubmissionPayload::new(RecordKind::Chapter);
                companion.series_slug = Some(series_slug.clone());
                companion.chapter_slug = record
                    .as_object()
                    .and_then(|r| text(r, &["slug", "id", "identifier"]));
                companion.data = Some(record.clone());
                payload.companions.push(companion);
            }
        }
    }

    if let Some(Value::Array(entries)) = root.get("announcements") {
        if !entries.is_empty() {
            let mut companion = SubmissionPayload::new(RecordKind::Announcement);
            companion.data = Some(Value::Array(entries.clone()));
            payload.companions.push(companion);
        }
    }

    payload
}

fn legacy_chapter_shape(root: &Map<String, Value>, chapter: &Map<String, Value>) -> SubmissionPayload {
    let mut payload = SubmissionPayload::new(RecordKind::Chapter);

    payload.series_slug = text(chapter, &["seriesSlug", "series_slug"])
        .or_else(|| match chapter.get("series") {
            Some(Value::String(s)) => non_blank(s),
            Some(Value::Object(series)) => text(series, &["slug"]),
            _ => None,
        })
        .or_else(|| text(root, &["seriesSlug", "series_slug"]));
    payload.chapter_slug = text(chapter, &["slug", "id", "identifier"])
        .or_else(|| text(root, &["chapterSlug", "chapter_slug"]));
    payload.data = Some(Value::Object(chapter.clone()));
    payload
}

/// First non-blank string found under any of `keys`.
fn text(obj: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|k| obj.get(*k).and_then(Value::as_str))
        .find_map(non_blank)
}

fn non_blank(s: &str) -> Option<String> {
    let trimmed = s.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}
