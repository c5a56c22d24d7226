//! The catalog document: the single JSON aggregate the store holds.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::records::{null_as_default, ChapterRecord, SeriesRecord};
use crate::errors::{CatalogError, CatalogResult};

/// Legacy layout: chapter sequences keyed by series slug.
pub type ChapterMap = BTreeMap<String, Vec<ChapterRecord>>;

/// Where a document keeps its chapters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChapterLayout {
    /// Top-level `chapters` mapping
    Legacy,
    /// `chapters` embedded in each series record
    Nested,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Most recent first
    #[serde(default, deserialize_with = "null_as_default")]
    pub series: Vec<SeriesRecord>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chapters: Option<ChapterMap>,

    #[serde(default, deserialize_with = "null_as_default")]
    pub announcements: Vec<Value>,

    /// Top-level keys this service does not interpret
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Document {
    /// Empty document in the nested layout.
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty document in the legacy layout.
    pub fn legacy() -> Self {
        Self {
            chapters: Some(ChapterMap::new()),
            ..Self::default()
        }
    }

    /// Decode raw stored bytes.
    pub fn from_slice(bytes: &[u8]) -> CatalogResult<Self> {
        serde_json::from_slice(bytes).map_err(|e| CatalogError::Decode(e.to_string()))
    }

    /// Canonical stored form (pretty JSON with trailing newline).
    pub fn to_bytes(&self) -> CatalogResult<Vec<u8>> {
        let mut bytes = serde_json::to_vec_pretty(self)
            .map_err(|e| CatalogError::Decode(e.to_string()))?;
        bytes.push(b'\n');
        Ok(bytes)
    }

    /// Detects the chapter layout by inspection.
    pub fn layout(&self) -> ChapterLayout {
        if self.chapters.is_some() {
            ChapterLayout::Legacy
        } else {
            ChapterLayout::Nested
        }
    }

    pub fn find_series(&self, slug: &str) -> Option<&SeriesRecord> {
        self.series.iter().find(|s| s.slug == slug)
    }

    pub fn series_position(&self, slug: &str) -> Option<usize> {
        self.series.iter().position(|s| s.slug == slug)
    }

    /// Chapters belonging to a series, whichever layout is in use.
    pub fn chapters_of(&self, slug: &str) -> &[ChapterRecord] {
        match &self.chapters {
            Some(map) => map.get(slug).map(Vec::as_slice).unwrap_or(&[]),
            None => self
                .find_series(slug)
                .and_then(|s| s.chapters.as_deref())
                .unwrap_or(&[]),
        }
    }

    /// Looks a chapter up by identifier across every series.
    pub fn find_chapter(&self, id: &str) -> Option<&ChapterRecord> {
        match &self.chapters {
            Some(map) => map
                .values()
                .flatten()
                .find(|c| c.is_addressable() && c.id() == id),
            None => self
                .series
                .iter()
                .filter_map(|s| s.chapters.as_deref())
                .flatten()
                .find(|c| c.is_addressable() && c.id() == id),
        }
    }
}
