//! Chapter storage capability
//!
//! A document keeps chapters either in a top-level mapping keyed by series
//! slug (legacy) or inside each series record (nested). The merge engine
//! works against [`ChapterStore`] and never converts one layout into the
//! other.

use serde_json::{Map, Value};

use crate::errors::{CatalogError, CatalogResult};
use crate::model::{ChapterLayout, ChapterMap, ChapterRecord, Document, SeriesRecord};

/// What an upsert did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upserted {
    Inserted,
    Replaced,
}

pub trait ChapterStore {
    fn layout(&self) -> ChapterLayout;

    /// Chapters currently stored for a series.
    fn list_for(&self, series_slug: &str) -> &[ChapterRecord];

    /// Identifier a new chapter gets under this layout.
    fn identify(&self, series_slug: &str, chapter_slug: &str, data: &Map<String, Value>, number: f64)
        -> String;

    /// Replace the chapter with the same identifier, else insert at head.
    fn upsert(&mut self, series_slug: &str, record: ChapterRecord) -> CatalogResult<Upserted>;
}

/// Picks the implementation matching the document's layout.
pub fn chapter_store(document: &mut Document) -> Box<dyn ChapterStore + '_> {
    match document.chapters.as_mut() {
        Some(map) => Box::new(LegacyChapters { map }),
        None => Box::new(NestedChapters {
            series: &mut document.series,
        }),
    }
}

fn upsert_into(chapters: &mut Vec<ChapterRecord>, record: ChapterRecord) -> Upserted {
    match chapters
        .iter()
        .position(|c| c.is_addressable() && c.id() == record.id())
    {
        Some(index) => {
            chapters[index] = record;
            Upserted::Replaced
        }
        None => {
            chapters.insert(0, record);
            Upserted::Inserted
        }
    }
}

/// Top-level `chapters` mapping
pub struct LegacyChapters<'a> {
    map: &'a mut ChapterMap,
}

impl ChapterStore for LegacyChapters<'_> {
    fn layout(&self) -> ChapterLayout {
        ChapterLayout::Legacy
    }

    fn list_for(&self, series_slug: &str) -> &[ChapterRecord] {
        self.map.get(series_slug).map(Vec::as_slice).unwrap_or(&[])
    }

    fn identify(&self, _series_slug: &str, chapter_slug: &str, _data: &Map<String, Value>, _number: f64)
        -> String {
        chapter_slug.to_string()
    }

    fn upsert(&mut self, series_slug: &str, record: ChapterRecord) -> CatalogResult<Upserted> {
        let chapters = self.map.entry(series_slug.to_string()).or_default();
        Ok(upsert_into(chapters, record))
    }
}

/// Chapters embedded in series records
pub struct NestedChapters<'a> {
    series: &'a mut Vec<SeriesRecord>,
}

impl ChapterStore for NestedChapters<'_> {
    fn layout(&self) -> ChapterLayout {
        ChapterLayout::Nested
    }

    fn list_for(&self, series_slug: &str) -> &[ChapterRecord] {
        self.series
            .iter()
            .find(|s| s.slug == series_slug)
            .and_then(|s| s.chapters.as_deref())
            .unwrap_or(&[])
    }

    fn identify(&self, series_slug: &str, _chapter_slug: &str, data: &Map<String, Value>, number: f64)
        -> String {
        let supplied = ["id", "identifier"]
            .iter()
            .filter_map(|k| data.get(*k).and_then(Value::as_str))
            .map(str::trim)
            .find(|s| !s.is_empty());

        match supplied {
            Some(id) => id.to_string(),
            None if number.fract() == 0.0 && number >= 0.0 => {
                format!("{}-{:03.0}", series_slug, number)
            }
            None => format!("{}-{}", series_slug, number),
        }
    }

    fn upsert(&mut self, series_slug: &str, record: ChapterRecord) -> CatalogResult<Upserted> {
        let parent = self
            .series
            .iter_mut()
            .find(|s| s.slug == series_slug)
            .ok_or_else(|| {
                CatalogError::NotFound(format!(
                    "series '{}' must exist before a chapter can be added",
                    series_slug
                ))
            })?;
        Ok(upsert_into(parent.chapters.get_or_insert_with(Vec::new), record))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn chapter(id: &str) -> ChapterRecord {
        serde_json::from_value(json!({"id": id, "pages": ["p"]})).unwrap()
    }

    #[test]
    fn test_store_selected_by_layout() {
        let mut legacy = Document::legacy();
        assert_eq!(chapter_store(&mut legacy).layout(), ChapterLayout::Legacy);

        let mut nested = Document::new();
        assert_eq!(chapter_store(&mut nested).layout(), ChapterLayout::Nested);
    }

    #[test]
    fn test_legacy_creates_sequence() {
        let mut doc = Document::legacy();
        let mut store = chapter_store(&mut doc);
        assert_eq!(store.upsert("a", chapter("c1")).unwrap(), Upserted::Inserted);
        assert_eq!(store.upsert("a", chapter("c2")).unwrap(), Upserted::Inserted);
        assert_eq!(store.upsert("a", chapter("c1")).unwrap(), Upserted::Replaced);

        let ids: Vec<_> = store.list_for("a").iter().map(|c| c.id()).collect();
        assert_eq!(ids, vec!["c2", "c1"]);
    }

    #[test]
    fn test_nested_requires_parent() {
        let mut doc = Document::new();
        let err = chapter_store(&mut doc).upsert("a", chapter("a-001")).unwrap_err();
        assert_eq!(err.status_code(), 404);
        assert!(err.to_string().contains("must exist"));
    }

    #[test]
    fn test_nested_identity_rule() {
        let mut doc = Document::new();
        let store = chapter_store(&mut doc);
        let empty = Map::new();
        assert_eq!(store.identify("a", "chapter-7", &empty, 7.0), "a-007");
        assert_eq!(store.identify("a", "x", &empty, 123.0), "a-123");
        assert_eq!(store.identify("a", "x", &empty, 7.5), "a-7.5");
        assert_eq!(store.identify("a", "x", &empty, 1e20), "a-100000000000000000000");

        let mut supplied = Map::new();
        supplied.insert("id".into(), json!("custom"));
        assert_eq!(store.identify("a", "x", &supplied, 1.0), "custom");
    }
}
