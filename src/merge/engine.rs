//! Merge engine
//!
//! `(Document, Submission) -> Document`. The input document is cloned and
//! never touched, so the committer can compare before and after.
//!
//! - Series: upsert by slug, new slugs go to the head of `series`
//! - Chapters: upsert by identifier through the layout's [`ChapterStore`]
//! - Announcements: prepended as one block

use serde_json::{Map, Value};

use super::chapter_store::{chapter_store, Upserted};
use crate::errors::{CatalogError, CatalogResult};
use crate::model::{
    number_from_value, number_value, ChapterLayout, ChapterRecord, Document, SeriesRecord,
    DEFAULT_CHAPTER_NUMBER,
};
use crate::submission::{Submission, ValidatedSubmission};

/// One change applied to the document.
#[derive(Debug, Clone, PartialEq)]
pub enum MergeEffect {
    SeriesInserted { slug: String },
    SeriesReplaced { slug: String },
    ChapterInserted { series: String, id: String },
    ChapterReplaced { series: String, id: String },
    AnnouncementsPrepended { count: usize },
}

/// Merge result: the new document and what changed.
#[derive(Debug, Clone)]
pub struct Merged {
    pub document: Document,
    pub effects: Vec<MergeEffect>,
}

/// Apply one submission to a copy of `document`.
pub fn merge(document: &Document, submission: &Submission) -> CatalogResult<Document> {
    let mut next = document.clone();
    apply(&mut next, submission)?;
    Ok(next)
}

/// Apply the primary submission and then its companions.
///
/// Either every record applies or the whole merge fails.
pub fn merge_all(document: &Document, submission: &ValidatedSubmission) -> CatalogResult<Merged> {
    let mut next = document.clone();
    let effects = submission
        .all()
        .map(|s| apply(&mut next, s))
        .collect::<CatalogResult<Vec<_>>>()?;

    Ok(Merged {
        document: next,
        effects,
    })
}

fn apply(document: &mut Document, submission: &Submission) -> CatalogResult<MergeEffect> {
    match submission {
        Submission::Series { slug, record } => upsert_series(document, slug, record),
        Submission::Chapter {
            series_slug,
            chapter_slug,
            data,
        } => upsert_chapter(document, series_slug, chapter_slug, data),
        Submission::Announcement { entries } => {
            document.announcements.splice(0..0, entries.iter().cloned());
            Ok(MergeEffect::AnnouncementsPrepended {
                count: entries.len(),
            })
        }
    }
}

// ==================
// Series
// ==================

fn upsert_series(
    document: &mut Document,
    slug: &str,
    record: &Map<String, Value>,
) -> CatalogResult<MergeEffect> {
    let layout = document.layout();
    if layout == ChapterLayout::Legacy && record.contains_key("chapters") {
        return Err(CatalogError::invalid(
            "data.chapters",
            "cannot be embedded in a series while the document keeps a chapter mapping",
        ));
    }

    let mut incoming: SeriesRecord = serde_json::from_value(Value::Object(record.clone()))
        .map_err(|e| CatalogError::invalid("data", e.to_string()))?;

    match document.series_position(slug) {
        Some(index) => {
            let existing = &mut document.series[index];
            if layout == ChapterLayout::Nested
                && incoming.chapters.is_none()
                && !incoming.meta.contains_key("chapters")
            {
                incoming.chapters = existing.chapters.take();
            }
            *existing = incoming;
            Ok(MergeEffect::SeriesReplaced { slug: slug.to_string() })
        }
        None => {
            document.series.insert(0, incoming);
            Ok(MergeEffect::SeriesInserted { slug: slug.to_string() })
        }
    }
}

// ==================
// Chapters
// ==================

fn upsert_chapter(
    document: &mut Document,
    series_slug: &str,
    chapter_slug: &str,
    data: &Map<String, Value>,
) -> CatalogResult<MergeEffect> {
    let mut store = chapter_store(document);
    let number = chapter_number(data, chapter_slug);
    let id = store.identify(series_slug, chapter_slug, data, number);
    let record = build_chapter(data, &id, number);

    let effect = match store.upsert(series_slug, record)? {
        Upserted::Inserted => MergeEffect::ChapterInserted {
            series: series_slug.to_string(),
            id,
        },
        Upserted::Replaced => MergeEffect::ChapterReplaced {
            series: series_slug.to_string(),
            id,
        },
    };
    Ok(effect)
}

/// Explicit `number`, else trailing digits of the chapter slug, else 1.
pub fn chapter_number(data: &Map<String, Value>, chapter_slug: &str) -> f64 {
    data.get("number")
        .and_then(number_from_value)
        .or_else(|| trailing_number(chapter_slug))
        .unwrap_or(DEFAULT_CHAPTER_NUMBER)
}

fn trailing_number(slug: &str) -> Option<f64> {
    let digits_start = slug
        .char_indices()
        .rev()
        .take_while(|(_, c)| c.is_ascii_digit())
        .last()
        .map(|(i, _)| i)?;
    slug[digits_start..].parse::<f64>().ok().filter(|n| n.is_finite())
}

fn build_chapter(data: &Map<String, Value>, id: &str, number: f64) -> ChapterRecord {
    let mut fields: Map<String, Value> = data
        .iter()
        .filter(|(key, _)| key.as_str() != "identifier")
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect();
    fields.insert("id".into(), Value::String(id.to_string()));
    fields.insert("number".into(), number_value(number));

    ChapterRecord::from_fields(fields)
}
